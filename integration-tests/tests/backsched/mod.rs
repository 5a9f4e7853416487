mod orchestrator;
mod process_runner;
