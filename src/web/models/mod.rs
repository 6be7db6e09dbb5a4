pub mod bazar_models;
