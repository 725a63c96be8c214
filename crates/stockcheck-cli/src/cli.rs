//! Command-line definition and argument decoding

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use stockcheck_model::{Actor, QueueMode, ReviewStatus, SubmissionId};

/// Decoded subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// File a report read from a JSON file
    Submit {
        /// Report file
        report: PathBuf,
        /// Submitter
        actor: Actor,
    },
    /// List the pending queue
    Pending,
    /// List reviewed submissions
    History {
        /// Only this status
        status: Option<ReviewStatus>,
    },
    /// Print one submission
    Show {
        /// Submission id
        id: SubmissionId,
    },
    /// Print the comparison for one submission
    Compare {
        /// Submission id
        id: SubmissionId,
    },
    /// Approve a submission
    Approve {
        /// Submission id
        id: SubmissionId,
        /// Reviewer
        actor: Actor,
    },
    /// Discard a submission
    Discard {
        /// Submission id
        id: SubmissionId,
        /// Reviewer
        actor: Actor,
        /// Optional reason
        reason: Option<String>,
    },
    /// Restore a reviewed submission
    Restore {
        /// Submission id
        id: SubmissionId,
        /// Acting reviewer
        actor: Actor,
    },
    /// Ask the submission gate
    Gate,
    /// Show or change queue settings
    Settings {
        /// New queue mode
        mode: Option<QueueMode>,
        /// New cooldown minutes
        block_minutes: Option<u32>,
        /// Who is changing them
        actor: Option<Actor>,
    },
}

impl Action {
    /// Whether the action can change the state file
    #[must_use]
    pub fn mutates(&self) -> bool {
        match self {
            Self::Submit { .. } | Self::Approve { .. } | Self::Discard { .. } | Self::Restore { .. } => true,
            Self::Settings { mode, block_minutes, .. } => mode.is_some() || block_minutes.is_some(),
            Self::Pending | Self::History { .. } | Self::Show { .. } | Self::Compare { .. } | Self::Gate => false,
        }
    }
}

/// One full invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// `--config`
    pub config: Option<PathBuf>,
    /// `--state`, overriding the config file
    pub state: Option<PathBuf>,
    /// `--at`, pinning the clock
    pub at: Option<DateTime<Utc>>,
    /// `--json` output
    pub json: bool,
    /// Subcommand
    pub action: Action,
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(SubmissionId))
        .help("Submission id")
}

fn actor_args(required: bool) -> [Arg; 2] {
    [
        Arg::new("user")
            .long("user")
            .required(required)
            .help("Acting user id"),
        Arg::new("name")
            .long("name")
            .help("Acting user display name (defaults to the user id)"),
    ]
}

/// The `stockcheck` command tree
#[must_use]
pub fn command() -> Command {
    Command::new("stockcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stock check submission and review")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON state file (overrides the config file)"),
        )
        .arg(
            Arg::new("at")
                .long("at")
                .global(true)
                .value_parser(value_parser!(DateTime<Utc>))
                .help("Pin the clock to an RFC 3339 instant"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .subcommand(
            Command::new("submit")
                .about("Submit a stock check report for review")
                .arg(
                    Arg::new("report")
                        .long("report")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Report JSON file"),
                )
                .args(actor_args(true)),
        )
        .subcommand(Command::new("pending").about("List submissions awaiting review"))
        .subcommand(
            Command::new("history")
                .about("List reviewed submissions")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .value_parser(["approved", "discarded"])
                        .help("Only show this status"),
                ),
        )
        .subcommand(Command::new("show").about("Print one submission").arg(id_arg()))
        .subcommand(
            Command::new("compare")
                .about("Compare a submission against its snapshot")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("approve")
                .about("Approve and apply a submission")
                .arg(id_arg())
                .args(actor_args(true)),
        )
        .subcommand(
            Command::new("discard")
                .about("Discard a submission")
                .arg(id_arg())
                .args(actor_args(true))
                .arg(Arg::new("reason").long("reason").help("Reason shown to the submitter")),
        )
        .subcommand(
            Command::new("restore")
                .about("Return a reviewed submission to pending")
                .arg(id_arg())
                .args(actor_args(true)),
        )
        .subcommand(Command::new("gate").about("Check whether a new submission is allowed"))
        .subcommand(
            Command::new("settings")
                .about("Show or change queue settings")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_parser(value_parser!(QueueMode))
                        .help("allow_multiple, block_until_resolved or block_for_duration"),
                )
                .arg(
                    Arg::new("block-minutes")
                        .long("block-minutes")
                        .value_parser(value_parser!(u32))
                        .help("Cooldown after each submission"),
                )
                .args(actor_args(false)),
        )
}

fn actor(args: &ArgMatches) -> Option<Actor> {
    let user = args.get_one::<String>("user")?;
    let name = args.get_one::<String>("name").map(String::as_str);
    Some(Actor::from_profile(user.clone(), name, Some(user.as_str())))
}

fn required_actor(args: &ArgMatches) -> anyhow::Result<Actor> {
    actor(args).context("--user is required")
}

fn id(args: &ArgMatches) -> anyhow::Result<SubmissionId> {
    args.get_one::<SubmissionId>("id").copied().context("submission id is required")
}

/// Decode parsed matches
///
/// # Errors
/// Missing required values or an unknown subcommand
pub fn decode(matches: &ArgMatches) -> anyhow::Result<Invocation> {
    let action = match matches.subcommand() {
        Some(("submit", args)) => Action::Submit {
            report: args
                .get_one::<PathBuf>("report")
                .cloned()
                .context("--report is required")?,
            actor: required_actor(args)?,
        },
        Some(("pending", _)) => Action::Pending,
        Some(("history", args)) => Action::History {
            status: match args.get_one::<String>("status").map(String::as_str) {
                Some("approved") => Some(ReviewStatus::Approved),
                Some("discarded") => Some(ReviewStatus::Discarded),
                _ => None,
            },
        },
        Some(("show", args)) => Action::Show { id: id(args)? },
        Some(("compare", args)) => Action::Compare { id: id(args)? },
        Some(("approve", args)) => Action::Approve {
            id: id(args)?,
            actor: required_actor(args)?,
        },
        Some(("discard", args)) => Action::Discard {
            id: id(args)?,
            actor: required_actor(args)?,
            reason: args.get_one::<String>("reason").cloned(),
        },
        Some(("restore", args)) => Action::Restore {
            id: id(args)?,
            actor: required_actor(args)?,
        },
        Some(("gate", _)) => Action::Gate,
        Some(("settings", args)) => Action::Settings {
            mode: args.get_one::<QueueMode>("mode").copied(),
            block_minutes: args.get_one::<u32>("block-minutes").copied(),
            actor: actor(args),
        },
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    };

    Ok(Invocation {
        config: matches.get_one::<PathBuf>("config").cloned(),
        state: matches.get_one::<PathBuf>("state").cloned(),
        at: matches.get_one::<DateTime<Utc>>("at").copied(),
        json: matches.get_flag("json"),
        action,
    })
}
