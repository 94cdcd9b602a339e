mod controls;
mod details;
mod panels;
mod requests;
mod stats;
mod status;
