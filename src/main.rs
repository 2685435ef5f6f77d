mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cli::{Cli, Commands};
use gitdrop::{
    filter_folders, format_size, Config, ContentManager, ContentStore, Credential, FolderContext,
    GitDropError, GitHubStore, SessionProvider, SessionStore, UploadFile,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = gitdrop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        gitdrop::logging::init_console_only(&config.logging.level);
    }

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> gitdrop::Result<ExitCode> {
    config.validate()?;

    let token = cli.token.ok_or(GitDropError::AuthRequired)?;
    let sessions = Arc::new(SessionStore::new());
    let store = GitHubStore::new(&config.repository, &config.http, sessions.clone())?;
    let session = store.authenticate(Credential::new(token)?).await?;
    sessions.login(session);
    info!(
        "Using {}/{}@{}",
        config.repository.owner, config.repository.repo, config.repository.branch
    );

    let manager = ContentManager::new(store, config.storage.clone());
    let mut ctx = manager.new_context();
    run_command(cli.command, &manager, &sessions, &mut ctx).await
}

/// Run one command, then end the session whether or not it succeeded.
async fn run_command<S: ContentStore>(
    command: Commands,
    manager: &ContentManager<S>,
    sessions: &SessionStore,
    ctx: &mut FolderContext,
) -> gitdrop::Result<ExitCode> {
    let result = execute(command, manager, sessions, ctx).await;
    sessions.logout();
    ctx.reset();
    result
}

async fn execute<S: ContentStore>(
    command: Commands,
    manager: &ContentManager<S>,
    sessions: &SessionStore,
    ctx: &mut FolderContext,
) -> gitdrop::Result<ExitCode> {
    let mut code = ExitCode::SUCCESS;

    match command {
        Commands::Whoami => {
            if let Some(user) = sessions.current_user() {
                println!("{} ({})", user.display(), user.login);
                println!("{}", user.avatar_url);
            }
        }
        Commands::Folders { filter } => {
            let folders = manager.list_folders().await?;
            let shown = filter_folders(&folders, filter.as_deref().unwrap_or(""));
            if shown.is_empty() {
                println!("No folders.");
            }
            for folder in shown {
                let count = manager.folder_file_count(&folder.name).await?;
                println!("{:<32} {count:>5} file(s)", folder.name);
            }
        }
        Commands::CreateFolder { name } => {
            let created = manager.create_folder(&name).await?;
            println!("Created folder {}", created.name);
        }
        Commands::DeleteFolder { name } => {
            let removed = manager.delete_folder(&name).await?;
            println!("Deleted folder {name} ({removed} object(s))");
        }
        Commands::Files { folder } => {
            let files = manager.list_files(ctx, folder.as_deref()).await?;
            if files.is_empty() {
                println!("No files.");
            }
            for file in files {
                println!(
                    "{:<40} {:>10} {:<8} {}  {}",
                    file.name,
                    format_size(file.size_bytes),
                    file.kind,
                    file.version_token,
                    file.public_url
                );
            }
        }
        Commands::Upload { folder, files } => {
            ctx.select(&folder);
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(UploadFile::from_path(path).await?);
            }

            let outcomes = manager
                .upload_files(ctx, &uploads, |p| {
                    eprintln!(
                        "[{}/{}] {:>3}% {}",
                        p.current, p.total, p.percentage, p.current_file
                    );
                })
                .await;

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(_) => println!("ok    {}", manager.file_url(ctx, &outcome.file)),
                    Err(e) => {
                        failed += 1;
                        println!("FAIL  {}: {e}", outcome.file);
                    }
                }
            }
            if failed > 0 {
                eprintln!("{failed} of {} upload(s) failed", outcomes.len());
                code = ExitCode::FAILURE;
            }
        }
        Commands::DeleteFile { folder, name, sha } => {
            ctx.select(&folder);
            manager.delete_file(ctx, &name, &sha).await?;
            println!("Deleted {name}");
        }
        Commands::Url { folder, name } => {
            ctx.select(&folder);
            println!("{}", manager.file_url(ctx, &name));
        }
    }

    Ok(code)
}
