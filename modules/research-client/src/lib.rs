pub mod chat;
pub mod research;
pub mod util;

pub use chat::ChatClient;
pub use research::{generate_location, generate_search_queries, LocationInfo, Researcher};
