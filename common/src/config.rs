use std::time::Duration;

/// Espera entre intentos de `GET /info` mientras el coordinator no responde.
pub const DEFAULT_BOOTSTRAP_RETRY: Duration = Duration::from_secs(2);
/// Espera entre intentos de `GET /task` ante errores de red.
pub const DEFAULT_TASK_RETRY: Duration = Duration::from_secs(2);
/// Espera del worker cuando recibe reduce "todavía no".
pub const DEFAULT_NOT_READY_BACKOFF: Duration = Duration::from_secs(10);
/// Gracia del coordinator entre "todo reducido" y cerrar el listener.
/// Tiene que ser mayor que `DEFAULT_NOT_READY_BACKOFF`.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(20);

/// Lee una duración en milisegundos de la env var `name`.
/// Si no está o no parsea, usa `default`.
pub fn env_millis(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Lee un entero opcional de la env var `name` (ausente o inválido = `None`).
pub fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
}
