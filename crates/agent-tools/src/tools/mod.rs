//! Built-in tool implementations.

mod animal_facts;
mod disabled;
mod horoscope;
mod recommend_albums;
mod risk_calculator;

pub use animal_facts::{CatFacts, DogFacts, MAX_FACTS};
pub use disabled::DisabledTool;
pub use horoscope::Horoscope;
pub use recommend_albums::{RecommendAlbums, NO_MATCHES};
pub use risk_calculator::RiskCalculator;
