//! Fixed option lists offered by the registration form.

/// Service sites (postos de trabalho).
pub const POSTOS: [&str; 16] = [
    "Andradina",
    "Assis",
    "Avaré",
    "Bauru",
    "Birigui",
    "Botucatu",
    "Dracena",
    "Itapetininga",
    "Itu",
    "Jahu",
    "Marília",
    "Ourinhos",
    "Penápolis",
    "Presidente Prudente",
    "Tatuí",
    "Tupã",
];

/// Highest numbered attendance table.
pub const MAX_NUMERO_MESA: u8 = 40;

/// Named locations offered alongside the numbered tables.
pub const LOCAIS_ESPECIAIS: [&str; 8] = [
    "Sala médica",
    "Exame teórico",
    "COREN",
    "Fazenda",
    "SERT",
    "Sabesp",
    "Recepção/Triagem",
    "Despachante",
];

/// External agencies a record can be routed to.
pub const RETAGUARDA_DESTINOS: [&str; 4] = ["COREN", "Poupatempo", "Fazenda", "Sabesp"];

/// Table options in form order: `1..=40` followed by the named locations.
#[must_use]
pub fn opcoes_mesa() -> Vec<String> {
    (1..=MAX_NUMERO_MESA)
        .map(|n| n.to_string())
        .chain(LOCAIS_ESPECIAIS.iter().map(|s| (*s).to_owned()))
        .collect()
}

#[must_use]
pub fn is_known_posto(posto: &str) -> bool {
    POSTOS.contains(&posto)
}

#[must_use]
pub fn is_known_mesa(mesa: &str) -> bool {
    if let Ok(n) = mesa.parse::<u8>() {
        return (1..=MAX_NUMERO_MESA).contains(&n) && n.to_string() == mesa;
    }
    LOCAIS_ESPECIAIS.contains(&mesa)
}

#[must_use]
pub fn is_known_destino(destino: &str) -> bool {
    RETAGUARDA_DESTINOS.contains(&destino)
}

#[cfg(test)]
#[path = "options_test.rs"]
mod tests;
