pub mod user_seed;
