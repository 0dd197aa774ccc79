use clap::Parser;
use memevault::cli::commands;
use memevault::cli::{Cli, Commands, Context};
use memevault::errors::Result;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // Needs no vault or identity.
        Commands::Completions { shell } => commands::completions::execute(shell),
        _ => Context::from_cli(&cli).and_then(|ctx| dispatch(&cli, &ctx)),
    };

    if let Err(e) = result {
        memevault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: &Cli, ctx: &Context) -> Result<()> {
    match cli.command {
        Commands::Init {
            ref image,
            raw,
            ref name,
        } => commands::init::execute(ctx, image.as_deref(), raw, name),
        Commands::Set { ref key, ref value } => {
            commands::set::execute(ctx, key, value.as_deref())
        }
        Commands::Get { ref key } => commands::get::execute(ctx, key.as_deref()),
        Commands::List => commands::list::execute(ctx),
        Commands::Unset { ref key, force } => commands::unset::execute(ctx, key, force),
        Commands::Run {
            ref command,
            clean_env,
        } => commands::run::execute(ctx, command, clean_env),
        Commands::Grant {
            ref name,
            ref public_key,
        } => commands::grant::execute(ctx, name, public_key),
        Commands::Access { ref action } => commands::access::execute(ctx, action),
        Commands::Keys { ref action } => commands::keys::execute(ctx, action),
        Commands::Scan { ref path } => commands::scan::execute(ctx, path.as_deref()),
        Commands::Audit {
            last,
            ref since,
            ref op,
            ref recipient_key,
        } => audit(
            ctx,
            last,
            since.as_deref(),
            op.as_deref(),
            recipient_key.as_deref(),
        ),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}

#[cfg(feature = "audit-log")]
fn audit(
    ctx: &Context,
    last: usize,
    since: Option<&str>,
    op: Option<&str>,
    key: Option<&str>,
) -> Result<()> {
    commands::audit_cmd::execute(ctx, last, since, op, key)
}

#[cfg(not(feature = "audit-log"))]
fn audit(
    _ctx: &Context,
    _last: usize,
    _since: Option<&str>,
    _op: Option<&str>,
    _key: Option<&str>,
) -> Result<()> {
    Err(memevault::errors::MemeVaultError::AuditError(
        "this build was compiled without the `audit-log` feature".into(),
    ))
}
