pub mod dispatch;
pub mod extraction;
pub mod jobs;
pub mod selection;
