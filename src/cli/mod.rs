pub mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::Config;
use crate::dto::application_dto::{ApplicationForm, CvAttachment};
use crate::dto::auth_dto::RegisterForm;
use crate::dto::job_dto::JobDraft;
use crate::error::Error;
use crate::models::{ApplicationStatus, EntityId, Role};
use crate::routes::pages::{approve_jobs, auth, create_job, jobs, manage_applications, nav};
use crate::routes::pages::manage_applications::StatusFilter;
use crate::routes::{Navigation, Route};
use crate::services::notification_service::Notice;
use crate::Portal;
use render::ViewOptions;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Terminal client for the SODIMAC recruitment portal")]
pub struct PortalCli {
    #[command(subcommand)]
    pub command: PortalCommand,

    /// Overrides SESSION_FILE
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PortalCommand {
    /// Sign in and remember the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password itself
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long, default_value = "candidate")]
        role: Role,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Render a page, following redirects
    Open {
        #[arg(default_value = "/")]
        path: String,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Only applications for this job
        #[arg(long)]
        job: Option<String>,
        /// active, all, or an exact application status
        #[arg(long, default_value = "active")]
        status: StatusFilter,
    },
    /// Apply to a job as a candidate
    Apply {
        job_id: String,
        #[arg(long)]
        cover_letter: String,
        #[arg(long)]
        experience: Option<String>,
        #[arg(long)]
        skills: Option<String>,
        /// Résumé to attach (PDF, DOC or DOCX)
        #[arg(long)]
        cv: Option<PathBuf>,
    },
    /// Post a new job
    CreateJob {
        #[arg(long)]
        title: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        job_type: String,
        #[arg(long)]
        salary: Option<String>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        requirements: Option<String>,
    },
    /// Approve a pending job
    ApproveJob { job_id: String },
    /// Reject a pending job
    RejectJob { job_id: String },
    /// Change an application's status and notify the candidate
    SetStatus {
        application_id: String,
        status: ApplicationStatus,
        /// Defaults to the suggested message for the new status
        #[arg(long)]
        message: Option<String>,
    },
    /// Save a candidate's résumé locally
    DownloadCv {
        file_name: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Interactive session that stays in sync with other windows
    Shell,
}

/// One line typed inside the shell.
#[derive(Parser)]
#[command(name = "portal", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: PortalCommand,
}

/// Splits a shell line the way a POSIX shell would, so quoted arguments
/// stay whole.
fn parse_shell_line(line: &str) -> std::result::Result<PortalCommand, String> {
    let words = shlex::split(line).ok_or_else(|| "Comillas sin cerrar".to_string())?;
    ShellLine::try_parse_from(words)
        .map(|parsed| parsed.command)
        .map_err(|err| err.to_string())
}

fn drain(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        println!("{}", render::notice(&notice));
    }
}

pub async fn handle_command(cli: PortalCli, config: &Config) -> Result<()> {
    let mut config = config.clone();
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    let portal = Portal::new(&config).context("Failed to start portal client")?;

    if let PortalCommand::Shell = cli.command {
        return shell(&portal).await;
    }

    let mut notices = portal.notifications.subscribe();
    portal.load().await;
    let result = execute(&portal, cli.command).await;
    drain(&mut notices);
    result
}

async fn execute(portal: &Portal, command: PortalCommand) -> Result<()> {
    match command {
        PortalCommand::Login { email, password } => {
            let next = auth::submit_login(portal, &email, &password).await?;
            portal.store.refresh().await;
            open(portal, next.path(), &ViewOptions::default());
        }

        PortalCommand::Register {
            name,
            email,
            password,
            confirm_password,
            role,
            phone,
            department,
        } => {
            let form = RegisterForm {
                name,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                role,
                phone,
                department,
            };
            let next = auth::submit_registration(portal, form).await?;
            println!("Inicia sesión en {}", next.path());
        }

        PortalCommand::Logout => {
            portal.session.logout();
            open(portal, nav::AFTER_LOGOUT.path(), &ViewOptions::default());
        }

        PortalCommand::Whoami => match portal.session.identity() {
            Some(identity) => println!(
                "{} <{}> · {} · id {}",
                identity.name,
                identity.email,
                identity.role.label(),
                identity.id
            ),
            None => println!("Sin sesión"),
        },

        PortalCommand::Open {
            path,
            search,
            department,
            location,
            job,
            status,
        } => {
            let options = ViewOptions {
                jobs: jobs::JobFilters {
                    search,
                    department,
                    location,
                },
                applications: manage_applications::ApplicationFilters {
                    job: job.map(EntityId::new),
                    status,
                },
            };
            open(portal, &path, &options);
        }

        PortalCommand::Apply {
            job_id,
            cover_letter,
            experience,
            skills,
            cv,
        } => {
            let cv = match cv {
                Some(path) => Some(
                    CvAttachment::from_path(&path)
                        .await
                        .with_context(|| format!("Cannot read CV {}", path.display()))?,
                ),
                None => None,
            };
            let form = ApplicationForm::new(&cover_letter, experience, skills);
            match jobs::apply(portal, &EntityId::new(job_id), form, cv).await {
                Ok(Some(application)) => println!(
                    "Postulación #{} [{}]",
                    application.id,
                    application.status.candidate_label()
                ),
                Ok(None) => {}
                Err(Error::Unauthenticated) => {
                    println!("Inicia sesión para postular: {}", Route::Login.path());
                }
                Err(err) => return Err(err.into()),
            }
        }

        PortalCommand::CreateJob {
            title,
            department,
            location,
            job_type,
            salary,
            description,
            requirements,
        } => {
            let draft = JobDraft {
                title,
                department,
                location,
                job_type,
                salary,
                description,
                requirements,
            };
            if let Some(job) = create_job::submit(portal, draft).await? {
                println!("Trabajo #{} [{}]", job.id, job.status.label());
            }
            open(portal, create_job::AFTER_SUBMIT.path(), &ViewOptions::default());
        }

        PortalCommand::ApproveJob { job_id } => {
            approve_jobs::approve(portal, &EntityId::new(job_id)).await?;
        }

        PortalCommand::RejectJob { job_id } => {
            approve_jobs::reject(portal, &EntityId::new(job_id)).await?;
        }

        PortalCommand::SetStatus {
            application_id,
            status,
            message,
        } => {
            let id = EntityId::new(application_id);
            let message = match message {
                Some(message) => Some(message),
                None => portal
                    .store
                    .snapshot()
                    .application(&id)
                    .map(|app| manage_applications::default_message(app, status)),
            };
            manage_applications::change_status(portal, &id, status, message).await?;
        }

        PortalCommand::DownloadCv { file_name, output } => {
            let bytes = manage_applications::download_cv(portal, &file_name).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(&file_name));
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Cannot write {}", output.display()))?;
            println!("CV guardado en {} ({} bytes)", output.display(), bytes.len());
        }

        PortalCommand::Shell => bail!("Already inside the shell"),
    }
    Ok(())
}

fn open(portal: &Portal, path: &str, options: &ViewOptions) {
    let session = portal.session_state();
    let route = match portal.navigate(path) {
        Navigation::Loading => {
            println!("Cargando...");
            return;
        }
        Navigation::Render(route) => route,
        Navigation::Redirect(route) => {
            debug!(from = %path, to = %route.path(), "redirect");
            println!("→ {}", route.path());
            route
        }
    };
    print!(
        "{}",
        render::page(route, &session, &portal.store.snapshot(), options)
    );
}

async fn shell(portal: &Portal) -> Result<()> {
    let _subscriptions = portal.start();

    let mut notices = portal.notifications.subscribe();
    let _printer = crate::services::Subscription::new(tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => println!("{}", render::notice(&notice)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }));

    info!("Interactive shell started");
    println!("Escribe un comando (por ejemplo `open /jobs`), o `exit` para salir.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        match parse_shell_line(line) {
            Ok(command) => {
                if let Err(err) = execute(portal, command).await {
                    println!("Error: {:#}", err);
                }
            }
            Err(err) => println!("{}", err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_arguments_stay_whole() {
        let command = parse_shell_line(r#"apply 3 --cover-letter "Tengo experiencia en caja""#).unwrap();
        match command {
            PortalCommand::Apply {
                job_id,
                cover_letter,
                ..
            } => {
                assert_eq!(job_id, "3");
                assert_eq!(cover_letter, "Tengo experiencia en caja");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn status_message_keeps_its_spaces() {
        let command =
            parse_shell_line("set-status 12 interview --message 'Te esperamos el lunes'").unwrap();
        match command {
            PortalCommand::SetStatus {
                status, message, ..
            } => {
                assert_eq!(status, ApplicationStatus::Interview);
                assert_eq!(message.as_deref(), Some("Te esperamos el lunes"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unclosed_quote_is_a_parse_error() {
        let err = parse_shell_line(r#"apply 3 --cover-letter "Tengo"#).unwrap_err();
        assert_eq!(err, "Comillas sin cerrar");
    }
}
