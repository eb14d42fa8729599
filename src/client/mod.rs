//! Client demographics, severance grants and CSV loading

mod data;
pub mod loader;

pub use data::{Client, Gender, Grant};
pub use loader::{
    load_clients, load_clients_from_reader, load_grants, load_grants_by_client,
    load_grants_from_reader, LoadError,
};
