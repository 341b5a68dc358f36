pub mod episodes;
pub mod import;
pub mod seasons;
pub mod settings;
pub mod shows;
