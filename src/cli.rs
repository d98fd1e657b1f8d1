use clap::{Parser, Subcommand, ValueEnum};
use opensea_client::PriceKind;

#[derive(Parser, Debug)]
#[command(name = "nft_activity")]
#[command(version, about = "OpenSea token activity history and account collections")]
#[command(after_help = r#"EXAMPLES:
    # Activity history for one token
    nft_activity history 0x06012c8cf97bead5deae237070f9587f8e7a266d 1500 0x742d...f44e

    # Keep an account's collection fresh on rinkeby
    nft_activity tokens 0x742d...f44e --watch --network rinkeby

ENVIRONMENT VARIABLES:
    NFT_OPENSEA__API_KEY    OpenSea API key
    RUST_LOG                Log filter (default: info)
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Network to query (defaults to unique_tokens.default_network)
    #[arg(long, global = true)]
    pub network: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Activity history for a single token
    History {
        /// Token contract address
        contract: String,
        token_id: String,
        /// Account used to scope semi-fungible histories
        account: String,
        /// Shorten receiver addresses to 0x1234…abcd
        #[arg(long)]
        abbreviate: bool,
    },

    /// Unique tokens owned by an account
    Tokens {
        owner: String,
        /// Keep refreshing until Ctrl-C
        #[arg(long)]
        watch: bool,
    },

    /// Last sale or current listing price of an account's asset
    Price {
        account: String,
        /// "<contract>/<token_id>"
        url_suffix: String,
        #[arg(value_enum, default_value_t = PriceKindArg::Sale)]
        kind: PriceKindArg,
    },

    /// Collection floor price for an asset
    Floor {
        /// "<contract>/<token_id>"
        url_suffix: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PriceKindArg {
    /// Last sale price
    #[default]
    Sale,
    /// Current listing price
    List,
}

impl From<PriceKindArg> for PriceKind {
    fn from(kind: PriceKindArg) -> Self {
        match kind {
            PriceKindArg::Sale => PriceKind::LastSale,
            PriceKindArg::List => PriceKind::CurrentListing,
        }
    }
}
