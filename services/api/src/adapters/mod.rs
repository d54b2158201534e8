pub mod db;
pub mod sentiment_llm;

pub use db::DbAdapter;
pub use sentiment_llm::OpenAiSentimentAdapter;
