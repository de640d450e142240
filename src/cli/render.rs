//! Plain-text rendering of each page for the terminal client.

use std::fmt::Write;

use crate::models::{Identity, JobPosting};
use crate::routes::pages::{
    applications, approve_jobs, create_job, dashboard, jobs, manage_applications, nav,
};
use crate::routes::Route;
use crate::services::jobs_service::PortalCache;
use crate::services::notification_service::{Notice, NoticeLevel};
use crate::services::session_service::SessionState;
use crate::utils::time::format_display_opt;

/// Filters typed on the command line for the list pages.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub jobs: jobs::JobFilters,
    pub applications: manage_applications::ApplicationFilters,
}

pub fn notice(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Info => "ℹ",
        NoticeLevel::Success => "✅",
        NoticeLevel::Error => "❌",
    };
    format!("{} {}: {}", marker, notice.title, notice.description)
}

pub fn header(session: &SessionState) -> String {
    let mut out = String::new();
    match session.identity() {
        Some(identity) => {
            let _ = writeln!(
                out,
                "SODIMAC Empleos | {} ({})",
                identity.name,
                identity.role.label()
            );
            let links: Vec<String> = nav::menu(Some(identity))
                .into_iter()
                .map(|item| format!("{} [{}]", item.label, item.route.path()))
                .collect();
            let _ = writeln!(out, "{}", links.join("  ·  "));
        }
        None => {
            let _ = writeln!(out, "SODIMAC Empleos | Iniciar sesión [/login]  ·  Registro [/register]");
        }
    }
    out
}

pub fn page(route: Route, session: &SessionState, cache: &PortalCache, options: &ViewOptions) -> String {
    let identity = session.identity();
    let mut out = header(session);
    let _ = writeln!(out, "\n== {} ==", route.title());

    let body = match (route, identity) {
        (Route::Home, _) => home(identity),
        (Route::Login, _) => {
            "Usa: portal login <email> --password <contraseña>\n".to_string()
        }
        (Route::Register, _) => {
            "Usa: portal register <nombre> <email> --password <contraseña> [--role candidate|manager|hr]\n"
                .to_string()
        }
        (Route::Jobs, _) => job_board(&jobs::job_board(cache, identity, &options.jobs)),
        (Route::Applications, Some(identity)) => my_applications(cache, identity),
        (Route::CreateJob, _) => create_job_form(),
        (Route::ApproveJobs, _) => pending(&approve_jobs::pending_jobs(cache)),
        (Route::Dashboard, _) => analytics(&dashboard::analytics(cache)),
        (Route::ManageApplications, Some(identity)) => manage(cache, identity, options),
        (Route::Applications | Route::ManageApplications, None) => {
            "Inicia sesión para ver esta página.\n".to_string()
        }
    };
    out.push_str(&body);
    if cache.loading {
        out.push_str("(cargando...)\n");
    }
    out
}

fn home(identity: Option<&Identity>) -> String {
    let mut out = String::from("Encuentra tu próximo trabajo en SODIMAC.\n");
    for action in nav::home_actions(identity) {
        let _ = writeln!(out, "  → {} [{}]", action.label, action.route.path());
    }
    out
}

fn job_line(job: &JobPosting) -> String {
    let mut line = format!(
        "#{} {} | {} | {} | {}",
        job.id, job.title, job.department, job.location, job.job_type
    );
    if let Some(salary) = &job.salary {
        let _ = write!(line, " | {}", salary);
    }
    line
}

fn job_board(board: &jobs::JobBoard) -> String {
    let mut out = String::new();
    if board.show_dashboard_link {
        let _ = writeln!(out, "Ver Dashboard [{}]", Route::Dashboard.path());
    }
    if !board.departments.is_empty() {
        let _ = writeln!(out, "Departamentos: {}", board.departments.join(", "));
    }
    if !board.locations.is_empty() {
        let _ = writeln!(out, "Ubicaciones: {}", board.locations.join(", "));
    }
    if board.cards.is_empty() && !board.loading {
        out.push_str("No se encontraron trabajos.\n");
    }
    for card in &board.cards {
        let marker = if card.applied { " [Ya Postulado]" } else { "" };
        let _ = writeln!(out, "{}{}", job_line(&card.job), marker);
        if !card.job.description.is_empty() {
            let _ = writeln!(out, "    {}", card.job.description);
        }
    }
    out
}

fn my_applications(cache: &PortalCache, identity: &Identity) -> String {
    let views = applications::my_applications(cache, identity);
    if views.is_empty() {
        return "Aún no has postulado. Explora nuestras oportunidades y comienza tu búsqueda.\n"
            .to_string();
    }

    let mut out = String::new();
    for view in views {
        let title = view
            .application
            .job
            .as_ref()
            .map(|job| job.title.as_str())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "#{} {} [{}] postulado: {}",
            view.application.id, title, view.status_label, view.applied
        );
        let steps: Vec<String> = view
            .timeline
            .iter()
            .map(|step| {
                let dot = if step.reached { "●" } else { "○" };
                format!("{} {}", dot, step.label)
            })
            .collect();
        let mut progress = steps.join(" > ");
        if let Some(outcome) = view.outcome {
            let _ = write!(progress, " > ● {}", outcome.candidate_label());
        }
        let _ = writeln!(out, "    {}", progress);
        for message in &view.messages {
            let _ = writeln!(out, "    ✉ {} ({})", message.text.replace('\n', "\n      "), message.sent);
        }
    }
    out
}

fn create_job_form() -> String {
    let mut out = String::from(
        "Usa: portal create-job --title .. --department .. --location .. --job-type .. --description ..\n",
    );
    let _ = writeln!(out, "Departamentos sugeridos: {}", create_job::DEPARTMENTS.join(", "));
    let _ = writeln!(out, "Tipos de contrato: {}", create_job::JOB_TYPES.join(", "));
    let _ = writeln!(out, "Ubicaciones: {}", create_job::LOCATIONS.join(", "));
    out
}

fn pending(jobs: &[JobPosting]) -> String {
    if jobs.is_empty() {
        return "No hay trabajos pendientes de aprobación.\n".to_string();
    }
    let mut out = String::new();
    for job in jobs {
        let author = job
            .created_by
            .as_ref()
            .and_then(|a| a.username.as_deref().or(a.email.as_deref()))
            .unwrap_or("desconocido");
        let _ = writeln!(
            out,
            "{} | creado por {} el {}",
            job_line(job),
            author,
            format_display_opt(job.created_at.as_ref())
        );
    }
    out
}

fn analytics(analytics: &dashboard::Analytics) -> String {
    let Some(stats) = analytics.stats else {
        return "Sin datos para mostrar.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "Trabajos activos: {}", stats.active_jobs);
    let _ = writeln!(out, "Postulaciones totales: {}", stats.total_applications);
    let _ = writeln!(out, "Tasa de aceptación: {:.1}%", stats.acceptance_rate);
    out.push_str("\nPostulaciones por oferta:\n");
    for entry in &analytics.per_job {
        let _ = writeln!(out, "  {:<40} {}", entry.title, entry.applications);
    }
    out.push_str("\nDistribución por estado:\n");
    for entry in &analytics.by_status {
        let _ = writeln!(out, "  {:<15} {}", entry.label, entry.count);
    }
    out
}

fn manage(cache: &PortalCache, identity: &Identity, options: &ViewOptions) -> String {
    let mut out = String::new();
    let jobs = manage_applications::relevant_jobs(cache, identity);
    let titles: Vec<String> = jobs
        .iter()
        .map(|job| format!("#{} {}", job.id, job.title))
        .collect();
    let _ = writeln!(out, "Trabajos: {}", titles.join(", "));
    let _ = writeln!(out, "Filtro de estado: {}", options.applications.status);

    let apps = manage_applications::filtered_applications(cache, identity, &options.applications);
    if apps.is_empty() {
        out.push_str("No hay postulaciones que coincidan con los filtros.\n");
    }
    for app in apps {
        let candidate = app
            .candidate
            .as_ref()
            .map(|c| c.username.as_str())
            .unwrap_or_default();
        let job = app.job.as_ref().map(|j| j.title.as_str()).unwrap_or_default();
        let _ = writeln!(
            out,
            "#{} {} → {} [{}] {}",
            app.id,
            candidate,
            job,
            app.status.label(),
            format_display_opt(app.applied_at.as_ref())
        );
        if let Some(cv) = &app.cv_file_name {
            let _ = writeln!(out, "    CV: {}", cv);
        }
    }
    out
}
