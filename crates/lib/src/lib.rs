//! EZSolver core library: chat webhook gateway that answers questions through a
//! computational knowledge engine, with image text recognition for photographed equations.

pub mod answers;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod gateway;
pub mod init;
pub mod normalize;
pub mod ocr;
pub mod replies;
pub mod router;
