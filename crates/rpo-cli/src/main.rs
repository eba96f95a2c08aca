#![deny(clippy::all, warnings)]

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use rpo_core::{
    bootstrap, build_plan, exec, find_installation, find_self_checkout, parse_invocation,
    resolve_client, resolve_interpreter, BootstrapConfig, CloneFailure, Invocation, SelfCheckout,
    Settings,
};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let orig_args: Vec<OsString> = env::args_os().skip(1).collect();
    let code = run(&orig_args)?;
    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing() {
    let filter = env::var("RPO_LOG").unwrap_or_else(|_| "rpo_core=warn,rpo_cli=warn".to_string());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(orig_args: &[OsString]) -> Result<i32> {
    let scan: Vec<String> = orig_args
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let invocation = parse_invocation(&scan);
    let settings = Settings::from_env();

    let cwd =
        env::current_dir().map_err(|err| eyre!("cannot determine working directory: {err}"))?;
    let wrapper_path =
        env::current_exe().map_err(|err| eyre!("cannot determine launcher path: {err}"))?;
    let self_checkout = wrapper_path.parent().and_then(find_self_checkout);

    let mut extra_args: Vec<OsString> = Vec::new();
    let (mut entry, mut rpo_dir) = find_installation(&cwd);

    if entry.is_none() {
        if invocation.help {
            print_usage();
            return Ok(1);
        }
        match invocation.command.as_deref() {
            Some("help") => return Ok(run_help(&invocation)),
            None => {
                eprintln!("error: rpo is not installed.  Use \"rpo init\" to install it here.");
                return Ok(1);
            }
            Some("init") | Some("gitc-init") => {
                let gitc = invocation.command.as_deref() == Some("gitc-init");
                let request =
                    match prepare_install(&invocation, &settings, self_checkout.as_ref(), &cwd, gitc)
                    {
                        Ok(request) => request,
                        Err(code) => return Ok(code),
                    };
                if let Err(err) = bootstrap(&request.target, &request.config, &settings) {
                    print_fatal(&err);
                    return Ok(1);
                }
                if let Some(dir) = &request.gitc_manifest_dir {
                    extra_args.push(format!("--gitc-manifest-dir={}", dir.display()).into());
                }
                let located = find_installation(&request.target);
                entry = located.0;
                rpo_dir = located.1;
            }
            Some(command) => {
                eprintln!("error: command '{command}' requires rpo to be installed first.");
                eprintln!("       Use \"rpo init\" to install it here.");
                return Ok(1);
            }
        }
    }

    let Some(mut entry_point) = entry else {
        eprintln!("error: rpo is not installed.  Use \"rpo init\" to install it here.");
        return Ok(1);
    };
    // A complete development checkout next to the launcher wins over the
    // installed copy.
    if let Some(checkout) = &self_checkout {
        entry_point = checkout.main.clone();
    }

    let interpreter = match resolve_interpreter(&settings) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("fatal: {err:#}");
            return Ok(1);
        }
    };
    let plan = build_plan(
        interpreter,
        &entry_point,
        &rpo_dir,
        &wrapper_path,
        orig_args,
        &extra_args,
    );
    Ok(exec(&plan))
}

struct InstallRequest {
    target: PathBuf,
    config: BootstrapConfig,
    gitc_manifest_dir: Option<PathBuf>,
}

fn prepare_install(
    invocation: &Invocation,
    settings: &Settings,
    self_checkout: Option<&SelfCheckout>,
    cwd: &Path,
    gitc: bool,
) -> std::result::Result<InstallRequest, i32> {
    let (options, gitc_client) = if gitc {
        let parsed: GitcInitCommand = parse_command("rpo gitc-init", &invocation.args)?;
        (parsed.options, parsed.gitc_client)
    } else {
        let parsed: InitCommand = parse_command("rpo init", &invocation.args)?;
        (parsed.options, None)
    };
    tracing::debug!(
        manifest_url = ?options.manifest_url,
        manifest_branch = ?options.manifest_branch,
        manifest_name = %options.manifest_name,
        mirror = options.mirror,
        reference = ?options.reference,
        depth = ?options.depth,
        archive = options.archive,
        groups = %options.groups,
        platform = %options.platform,
        config_name = options.config_name,
        "manifest options are forwarded to the installed tool"
    );

    let mut config = match self_checkout {
        Some(checkout) => match BootstrapConfig::from_checkout(settings, checkout) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("fatal: {err:#}");
                return Err(1);
            }
        },
        None => BootstrapConfig::new(settings),
    };
    if let Some(url) = options.repo_url {
        config.url = url;
    }
    if let Some(revision) = options.repo_branch {
        config.revision = revision;
    }
    config.quiet = options.quiet;
    config.verify = !options.no_repo_verify;
    config.clone_bundle = !options.no_clone_bundle;

    let (target, gitc_manifest_dir) = if gitc {
        let client = gitc_client.unwrap_or_default();
        match resolve_client(&settings.gitc_config_path, &client) {
            Ok(client) => (client.client_dir.clone(), Some(client.client_dir)),
            Err(err) => {
                eprintln!("fatal: {err:#}");
                return Err(1);
            }
        }
    } else {
        (cwd.to_path_buf(), None)
    };

    Ok(InstallRequest {
        target,
        config,
        gitc_manifest_dir,
    })
}

fn parse_command<T: Parser>(bin: &str, args: &[String]) -> std::result::Result<T, i32> {
    let argv = std::iter::once(bin.to_string()).chain(args.iter().cloned());
    match T::try_parse_from(argv) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            // clap renders its own help and usage output.
            let code = i32::from(err.use_stderr());
            let _ = err.print();
            Err(code)
        }
    }
}

fn print_fatal(err: &anyhow::Error) {
    if let Some(failure) = err.downcast_ref::<CloneFailure>() {
        if let Some(detail) = failure.detail() {
            eprintln!("{detail}");
        }
    }
    eprintln!("fatal: {err:#}");
}

fn print_usage() {
    eprintln!("usage: rpo COMMAND [ARGS]");
    eprintln!();
    eprintln!("rpo is not yet installed. Use \"rpo init\" to install it here.");
    eprintln!();
    eprintln!("The most commonly used rpo commands are:");
    eprintln!("  init      Install rpo in the current working directory");
    eprintln!("  help      Display detailed help on a command");
    eprintln!();
    eprintln!("For access to the full online help, install rpo (\"rpo init\").");
}

fn run_help(invocation: &Invocation) -> i32 {
    match invocation.args.first().map(String::as_str) {
        Some("init") => {
            let _ = InitCommand::command().print_long_help();
            0
        }
        Some("gitc-init") => {
            let _ = GitcInitCommand::command().print_long_help();
            0
        }
        Some(command) => {
            eprintln!("error: '{command}' is not a bootstrap command.");
            eprintln!("       For access to online help, install rpo (\"rpo init\").");
            1
        }
        None => {
            print_usage();
            1
        }
    }
}

/// Options of `rpo init`. The launcher consumes the repo-url/repo-branch/
/// verification/bundle/quiet settings; everything is forwarded verbatim to
/// the installed tool afterwards.
#[derive(clap::Args, Debug)]
struct InitOptions {
    #[arg(short, long, help = "be quiet")]
    quiet: bool,
    #[arg(
        short = 'u',
        long,
        value_name = "URL",
        help = "manifest repository location"
    )]
    manifest_url: Option<String>,
    #[arg(
        short = 'b',
        long,
        value_name = "REVISION",
        help = "manifest branch or revision"
    )]
    manifest_branch: Option<String>,
    #[arg(
        short = 'm',
        long,
        value_name = "NAME.xml",
        default_value = "default.xml",
        help = "initial manifest file"
    )]
    manifest_name: String,
    #[arg(
        long,
        help = "create a replica of the remote repositories rather than a client working directory"
    )]
    mirror: bool,
    #[arg(long, value_name = "DIR", help = "location of mirror directory")]
    reference: Option<String>,
    #[arg(
        long,
        value_name = "DEPTH",
        help = "create a shallow clone with given depth; see git clone"
    )]
    depth: Option<u32>,
    #[arg(
        long,
        help = "checkout an archive instead of a git repository for each project"
    )]
    archive: bool,
    #[arg(
        short = 'g',
        long,
        value_name = "GROUP",
        default_value = "default",
        help = "restrict manifest projects to ones with specified group(s)"
    )]
    groups: String,
    #[arg(
        short = 'p',
        long,
        value_name = "PLATFORM",
        default_value = "auto",
        help = "restrict manifest projects to ones with a specified platform group"
    )]
    platform: String,
    #[arg(long, help = "disable use of /clone.bundle on HTTP/HTTPS")]
    no_clone_bundle: bool,
    #[arg(long, help = "always prompt for name/email")]
    config_name: bool,
    #[arg(long, value_name = "URL", help = "rpo repository location")]
    repo_url: Option<String>,
    #[arg(long, value_name = "REVISION", help = "rpo branch or revision")]
    repo_branch: Option<String>,
    #[arg(long, help = "do not verify rpo source code")]
    no_repo_verify: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "rpo init",
    about = "Install rpo in the current working directory",
    disable_version_flag = true
)]
struct InitCommand {
    #[command(flatten)]
    options: InitOptions,
}

#[derive(Parser, Debug)]
#[command(
    name = "rpo gitc-init",
    about = "Install rpo into a GITC client directory",
    disable_version_flag = true
)]
struct GitcInitCommand {
    #[command(flatten)]
    options: InitOptions,
    #[arg(
        long = "gitc-client",
        value_name = "NAME",
        help = "name of the gitc_client instance to create or modify"
    )]
    gitc_client: Option<String>,
}
