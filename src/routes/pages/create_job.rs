use tracing::warn;
use validator::Validate;

use super::failure_text;
use crate::dto::job_dto::JobDraft;
use crate::error::{Error, Result};
use crate::models::{JobPosting, JobStatus, Role};
use crate::routes::Route;
use crate::Portal;

pub const DEPARTMENTS: [&str; 14] = [
    "Ventas Retail (Tienda)",
    "Cajas y Tesorería",
    "Logística y Distribución",
    "Atención al Cliente y Postventa",
    "Administración y Contabilidad",
    "Recursos Humanos y Bienestar",
    "Marketing y Publicidad Digital",
    "Tecnología y Sistemas (IT)",
    "Mantenimiento e Infraestructura",
    "Gerencia de Tienda y Operaciones",
    "Proyectos Especiales y Decoración",
    "E-commerce y Ventas Online",
    "Prevención de Pérdidas",
    "Visual Merchandising",
];

pub const JOB_TYPES: [&str; 5] = [
    "Tiempo completo",
    "Medio tiempo",
    "Temporal (Proyecto)",
    "Prácticas Profesionales",
    "Fin de Semana y Feriados",
];

pub const LOCATIONS: [&str; 15] = [
    "Lima - San Miguel (Plaza San Miguel)",
    "Lima - Jockey Plaza (Surco)",
    "Lima - MegaPlaza (Independencia)",
    "Lima - Miraflores (Oficinas Centrales)",
    "Lima - Callao (Centro de Distribución)",
    "Arequipa - Mall Aventura Porongoche",
    "Arequipa - Parque Lambramani",
    "Trujillo - Mallplaza Trujillo",
    "Chiclayo - Real Plaza Chiclayo",
    "Piura - Open Plaza Piura",
    "Cusco - Real Plaza Cusco",
    "Ica - El Quinde Shopping Plaza",
    "Huancayo - Real Plaza Huancayo",
    "Remoto (Perú)",
    "Híbrido (Lima)",
];

/// Page shown once a posting is accepted.
pub const AFTER_SUBMIT: Route = Route::Jobs;

fn created_notice(role: Role) -> &'static str {
    match role {
        Role::Hr => "El trabajo ha sido creado y aprobado automáticamente.",
        Role::Manager | Role::Candidate => "El trabajo ha sido enviado para aprobación de RRHH.",
    }
}

/// Validates and posts a new job. HR postings go live immediately, manager
/// postings wait for approval.
pub async fn submit(portal: &Portal, draft: JobDraft) -> Result<Option<JobPosting>> {
    let Some(identity) = portal.session.identity() else {
        portal.notifications.error(
            "Sesión no encontrada",
            "Tu sesión ha expirado. Por favor, inicia sesión de nuevo para continuar.",
        );
        return Err(Error::Unauthenticated);
    };
    if !identity.role.is_staff() {
        return Err(Error::Forbidden(Route::CreateJob.path().to_string()));
    }

    let draft = draft.normalized();
    if let Err(errors) = draft.validate() {
        portal.notifications.error(
            "Campos Incompletos",
            "Por favor completa todos los campos marcados con *",
        );
        return Err(errors.into());
    }

    let payload = draft.with_status(JobStatus::initial_for(identity.role));
    match portal.store.create_job(&payload).await {
        Ok(job) => {
            portal
                .notifications
                .success("¡Trabajo creado!", created_notice(identity.role));
            Ok(job)
        }
        Err(err) => {
            warn!(title = %payload.draft.title, "job creation failed: {}", err);
            portal.notifications.error(
                "Error al crear trabajo",
                failure_text(&err, "Ocurrió un error. Inténtalo de nuevo."),
            );
            Err(err.into())
        }
    }
}
