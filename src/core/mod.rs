pub mod html;
pub mod mapper;
pub mod session;

pub use crate::domain::model::{KoList, MapRequest, RetrievalOutcome, SessionState};
pub use crate::domain::ports::{ConfigProvider, FormBrowser, Storage};
pub use crate::utils::error::Result;
