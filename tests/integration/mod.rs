mod pipeline;
mod scheduler;
