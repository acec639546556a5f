pub mod supabase;

pub use reqwest::Method;
