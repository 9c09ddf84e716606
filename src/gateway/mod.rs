//! Gateway: HTTP surface, protected write dispatch, parallel fan-out reads

mod dispatcher;
mod fanout;
mod router;
mod server;

pub use dispatcher::Dispatcher;
pub use fanout::FanoutAggregator;
pub use router::{AppState, create_router};
pub use server::Gateway;
