use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
/// Rendering used by `show` and `list`.
pub enum CliOutputFormat {
    #[default]
    Text,
    Json,
}
