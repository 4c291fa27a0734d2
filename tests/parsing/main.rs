mod errors;
mod samples;
