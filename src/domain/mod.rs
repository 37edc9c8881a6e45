pub mod article;
pub mod digest;

pub use article::{Article, NewArticle, ARTICLE_ID_LEN};
pub use digest::Digest;
