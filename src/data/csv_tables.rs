use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::{
    error::RecResult,
    models::{Catalog, InteractionLog, Item, ItemId, Rating, UserId},
};

/// Raw row of the cars CSV
#[derive(Debug, Clone, Deserialize)]
pub struct CarRecord {
    #[serde(rename = "carID")]
    pub car_id: i64,
    #[serde(rename = "Make Model Year")]
    pub make_model_year: String,
    #[serde(rename = "Features", default)]
    pub features: Option<String>,
}

impl From<CarRecord> for Item {
    fn from(record: CarRecord) -> Self {
        Item {
            id: ItemId(record.car_id),
            title: record.make_model_year,
            features: record.features.unwrap_or_default(),
        }
    }
}

/// Raw row of the ratings CSV
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRecord {
    #[serde(rename = "userID")]
    pub user_id: i64,
    #[serde(rename = "carID")]
    pub car_id: i64,
    #[serde(rename = "Rating")]
    pub rating: f64,
}

impl From<RatingRecord> for Rating {
    fn from(record: RatingRecord) -> Self {
        Rating {
            user_id: UserId(record.user_id),
            item_id: ItemId(record.car_id),
            value: record.rating,
        }
    }
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// Reads a catalog from CSV with `carID`, `Make Model Year` and `Features` columns
///
/// Extra columns are ignored; an empty `Features` cell becomes "".
pub fn read_catalog<R: Read>(source: R) -> RecResult<Catalog> {
    let items = reader(source)
        .deserialize::<CarRecord>()
        .map(|row| row.map(Item::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog::new(items))
}

/// Reads ratings from CSV with `userID`, `carID` and `Rating` columns
pub fn read_ratings<R: Read>(source: R) -> RecResult<InteractionLog> {
    let ratings = reader(source)
        .deserialize::<RatingRecord>()
        .map(|row| row.map(Rating::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InteractionLog::new(ratings))
}

pub fn load_catalog(path: impl AsRef<Path>) -> RecResult<Catalog> {
    let path = path.as_ref();
    let catalog = read_catalog(std::fs::File::open(path)?)?;
    tracing::info!(path = %path.display(), cars = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

pub fn load_ratings(path: impl AsRef<Path>) -> RecResult<InteractionLog> {
    let path = path.as_ref();
    let ratings = read_ratings(std::fs::File::open(path)?)?;
    tracing::info!(path = %path.display(), ratings = ratings.len(), "Ratings loaded");
    Ok(ratings)
}
