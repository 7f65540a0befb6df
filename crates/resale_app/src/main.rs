mod platform;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "resale", about = "Compare a product photo against active and sold listings")]
pub(crate) struct Cli {
    /// Product photo to search with
    pub main_image: PathBuf,

    /// Additional photos of the same item
    #[arg(long = "extra")]
    pub extra_images: Vec<PathBuf>,

    /// Free-text description sent along with the photos
    #[arg(long)]
    pub text: Option<String>,

    /// Known item name, skips guessing the product
    #[arg(long)]
    pub item_name: Option<String>,

    /// Which listings to compare against
    #[arg(long, value_enum, default_value_t = platform::CliMode::Both)]
    pub mode: platform::CliMode,

    /// Identify the product with a reverse image search first
    #[arg(long)]
    pub guided: bool,

    /// Candidate to pick in guided mode (0-based)
    #[arg(long, default_value_t = 0)]
    pub pick: usize,

    /// Replacement title for the picked candidate in guided mode
    #[arg(long)]
    pub title: Option<String>,

    /// Path to the RON config file
    #[arg(long, default_value = "./resale.ron")]
    pub config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::run_app(cli)
}
