pub mod areas;
pub mod events;
pub mod health;
pub mod kpis;
pub mod ordenes;
pub mod temporizador;
