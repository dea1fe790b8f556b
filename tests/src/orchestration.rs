mod cancellation;
mod scenarios;
