use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a task to completion against the in-memory demo browser and a
    /// canned LLM, printing the final outcome.
    Run {
        /// Natural-language task description, e.g. "go to https://example.com".
        task: String,
    },
    /// Run a task with step-history persistence enabled, then immediately
    /// replay it through the live action registry. There is no
    /// cross-process session store wired in, so this only demonstrates the
    /// replay path against the history the run just produced.
    Replay {
        /// Natural-language task description.
        task: String,
    },
}
