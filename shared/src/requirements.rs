use serde::Serialize;

/// Paperwork SUCAMEC asks for, grouped by license type.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LicenseRequirements {
    pub general: &'static [&'static str],
    #[serde(rename = "tipoA")]
    pub tipo_a: &'static [&'static str],
    #[serde(rename = "tipoB")]
    pub tipo_b: &'static [&'static str],
    #[serde(rename = "tipoC")]
    pub tipo_c: &'static [&'static str],
}

pub const LICENSE_REQUIREMENTS: LicenseRequirements = LicenseRequirements {
    general: &[
        "DNI vigente (original y copia)",
        "Certificado de antecedentes policiales (no mayor a 3 meses)",
        "Certificado de antecedentes penales (no mayor a 3 meses)",
        "Certificado de antecedentes judiciales (no mayor a 3 meses)",
        "Certificado psicológico (emitido por profesional autorizado)",
        "Certificado médico (emitido por centro de salud autorizado)",
        "Declaración jurada de domicilio",
        "Recibo de servicios (luz, agua o teléfono)",
        "Fotografías tamaño pasaporte (4 unidades)",
    ],
    tipo_a: &[
        "Licencia SUCAMEC Tipo A (Uso Policial)",
        "Constancia de pertenencia a institución policial",
        "Autorización de la jefatura policial",
    ],
    tipo_b: &[
        "Licencia SUCAMEC Tipo B (Uso Militar)",
        "Constancia de pertenencia a fuerzas armadas",
        "Autorización del comando militar",
        "Certificado de capacitación en armamento",
    ],
    tipo_c: &[
        "Licencia SUCAMEC Tipo C (Seguridad Privada)",
        "Certificado de empresa de seguridad registrada en SUCAMEC",
        "Contrato de trabajo vigente con empresa de seguridad",
        "Certificado de capacitación en seguridad privada",
    ],
};
