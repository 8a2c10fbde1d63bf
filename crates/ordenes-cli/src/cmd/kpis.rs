use crate::output::print_json;
use ordenes_core::report::Kpis;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let kpis = Kpis::compute(&engine.store().list_orders(None)?);
    if json {
        return print_json(&kpis);
    }
    println!("Total orders:            {}", kpis.total_ordenes);
    println!("New:                     {}", kpis.nuevas);
    println!("Pending:                 {}", kpis.pendientes);
    println!("Overdue:                 {}", kpis.vencidas);
    println!("Completed:               {}", kpis.completadas);
    println!("Closed without solution: {}", kpis.cerradas_sin_solucion);
    Ok(())
}
