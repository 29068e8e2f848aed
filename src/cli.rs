use chrono::{DateTime, Utc};
use clap::{value_parser, Arg, ArgAction, Command};

pub const TIERS: [&str; 4] = ["free", "basic", "pro", "enterprise"];

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn page_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("page")
            .long("page")
            .value_parser(value_parser!(u32))
            .default_value("1"),
    )
    .arg(
        Arg::new("page-size")
            .long("page-size")
            .value_parser(value_parser!(u32))
            .default_value("50"),
    )
}

fn card_filter_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("rarity").long("rarity").help("common, uncommon, rare, epic, legendary, mythic"))
        .arg(Arg::new("type").long("type").help("Dad type"))
        .arg(
            Arg::new("series")
                .long("series")
                .value_parser(value_parser!(u32)),
        )
        .arg(Arg::new("search").long("search").help("Search name and flavor text"))
}

fn id_arg(name: &'static str) -> Arg {
    Arg::new(name).required(true)
}

pub fn build_cli() -> Command {
    let cards = Command::new("cards")
        .about("Card catalogue")
        .subcommand_required(true)
        .subcommand(card_filter_args(page_args(Command::new("list").about("List one page of cards"))))
        .subcommand(Command::new("get").about("Get a card by id").arg(id_arg("id")))
        .subcommand(
            Command::new("random")
                .about("Draw random cards")
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_parser(value_parser!(u32))
                        .default_value("1"),
                )
                .arg(Arg::new("rarity").long("rarity"))
                .arg(Arg::new("type").long("type"))
                .arg(
                    Arg::new("exclude")
                        .long("exclude")
                        .action(ArgAction::Append)
                        .help("Card id to exclude (repeatable)"),
                ),
        )
        .subcommand(
            card_filter_args(Command::new("all").about("Fetch every matching card across all pages"))
                .arg(
                    Arg::new("max-pages")
                        .long("max-pages")
                        .value_parser(value_parser!(u32))
                        .default_value("1000"),
                ),
        );

    let packs = Command::new("packs")
        .about("Pack generation")
        .subcommand_required(true)
        .subcommand(
            Command::new("generate")
                .arg(Arg::new("pack-type").long("pack-type").default_value("standard"))
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_parser(value_parser!(u32))
                        .default_value("1"),
                )
                .arg(Arg::new("design").long("design"))
                .arg(
                    Arg::new("series")
                        .long("series")
                        .value_parser(value_parser!(u32)),
                ),
        );

    let collection = page_args(
        Command::new("collection")
            .about("A user's collection")
            .arg(id_arg("user"))
            .arg(Arg::new("rarity").long("rarity"))
            .arg(Arg::new("sort-by").long("sort-by").default_value("rarity"))
            .arg(Arg::new("sort-order").long("sort-order").default_value("desc")),
    );

    let leaderboard = Command::new("leaderboard")
        .about("Global leaderboard")
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_parser(value_parser!(u32))
                .default_value("100"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_parser(value_parser!(u32))
                .default_value("0"),
        );

    let events = Command::new("events")
        .about("Events")
        .subcommand_required(true)
        .subcommand(
            Command::new("list").arg(Arg::new("status").long("status").help("active, upcoming, ended")),
        )
        .subcommand(Command::new("get").arg(id_arg("id")));

    let keys = Command::new("keys")
        .about("API key management")
        .subcommand_required(true)
        .subcommand(Command::new("list"))
        .subcommand(
            Command::new("create")
                .arg(id_arg("name"))
                .arg(
                    Arg::new("tier")
                        .long("tier")
                        .value_parser(TIERS)
                        .default_value("free"),
                )
                .arg(
                    Arg::new("expires-at")
                        .long("expires-at")
                        .value_parser(parse_timestamp)
                        .help("RFC 3339 timestamp"),
                )
                .arg(
                    Arg::new("allowed-origin")
                        .long("allowed-origin")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("revoke").arg(id_arg("id")));

    Command::new("dadddeck")
        .about("DadDeck trading card game API client")
        .disable_version_flag(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-retries")
                .long("max-retries")
                .global(true)
                .value_parser(value_parser!(u32))
                .default_value("3")
                .help("Attempts per call when rate limited (1 disables retrying)"),
        )
        .arg(
            Arg::new("include-rate")
                .long("include-rate")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Include the rate-limit snapshot in output"),
        )
        .subcommand(cards)
        .subcommand(packs)
        .subcommand(collection)
        .subcommand(leaderboard)
        .subcommand(events)
        .subcommand(keys)
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins over RUST_LOG; default to info. Logs go to stderr.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}
