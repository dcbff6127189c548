pub mod nested;
pub mod object;
pub mod viewport;
