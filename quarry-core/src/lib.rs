mod as_value;
mod cache;
mod column;
mod compile;
mod config;
mod connection;
mod data_set;
mod database;
mod driver;
mod entity;
mod error;
mod executor;
mod expression;
mod hash_key;
mod identifier;
mod join;
mod live;
mod macros;
mod prepared;
mod projection;
mod query;
mod statement;
mod table_ref;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cache::*;
pub use column::*;
pub use compile::*;
pub use config::*;
pub use connection::*;
pub use data_set::*;
pub use database::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use hash_key::*;
pub use identifier::*;
pub use join::*;
pub use live::*;
pub use prepared::*;
pub use projection::*;
pub use query::*;
pub use statement::*;
pub use table_ref::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericSqlWriter, SqlWriter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;
