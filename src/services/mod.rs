pub mod geocoding;
pub mod intents;
pub mod matching;
