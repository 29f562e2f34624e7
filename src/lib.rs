pub mod configs;
pub mod item;
pub mod seed;
pub mod web;
