pub mod catalog;
pub mod recommender;

pub use catalog::{AccessToken, CatalogApi, CatalogService, HttpCatalogApi};
pub use recommender::{ChatApi, OpenAiChat, Recommender};
