pub mod aws;
pub mod cloud;
pub mod conns;
pub mod datastore;
pub mod handler;
pub mod manager;
pub mod names;
pub mod plan;
pub mod registry;
pub mod resource;
pub mod storage;
pub mod tags;
pub mod types;
