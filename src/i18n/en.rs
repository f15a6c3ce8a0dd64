//! English translations

use std::collections::HashMap;

pub fn get_translations() -> HashMap<String, String> {
    let mut t = HashMap::new();

    // App general
    t.insert("app.title".into(), "GasControl".into());
    t.insert("app.version".into(), "Version".into());

    // Units
    t.insert("unit.cubic_meters".into(), "m\u{00B3}".into());

    // Formatting
    t.insert("format.invalid_date".into(), "Invalid date".into());

    // Consumption checks
    t.insert("validation.consumption_negative".into(), "Consumption cannot be negative".into());
    t.insert("validation.consumption_not_finite".into(), "Consumption must be a valid number".into());
    t.insert("validation.consumption_high".into(), "Consumption abnormally high ({percent}% of average)".into());
    t.insert("validation.consumption_high_zero_average".into(), "Consumption abnormally high (previous readings averaged zero)".into());

    // Reading form
    t.insert("form.gasometro_required".into(), "Select a meter".into());
    t.insert("form.data_leitura_required".into(), "Reading date is required".into());
    t.insert("form.data_leitura_invalid".into(), "Reading date is invalid".into());
    t.insert("form.data_leitura_future".into(), "Reading date cannot be in the future".into());
    t.insert("form.consumo_too_high".into(), "Consumption too high".into());

    // Meter form
    t.insert("form.identificador_required".into(), "Identifier is required".into());
    t.insert("form.identificador_too_long".into(), "Identifier too long".into());
    t.insert("form.descricao_required".into(), "Description is required".into());
    t.insert("form.descricao_too_long".into(), "Description too long".into());
    t.insert("form.localizacao_required".into(), "Location is required".into());
    t.insert("form.localizacao_too_long".into(), "Location too long".into());

    // Notifications
    t.insert("notify.unexpected_error".into(), "Unexpected error".into());
    t.insert("notify.login_success".into(), "Logged in successfully!".into());
    t.insert("notify.login_failed".into(), "Login failed: {reason}".into());
    t.insert("notify.invalid_credentials".into(), "Invalid credentials".into());
    t.insert("notify.logout_success".into(), "Logged out successfully!".into());
    t.insert("notify.session_expired".into(), "Session expired, please log in again".into());
    t.insert("notify.gasometer_created".into(), "Meter created!".into());
    t.insert("notify.gasometer_updated".into(), "Meter updated!".into());
    t.insert("notify.gasometer_deleted".into(), "Meter deleted!".into());
    t.insert("notify.reading_created".into(), "Reading recorded!".into());
    t.insert("notify.reading_updated".into(), "Reading updated!".into());
    t.insert("notify.reading_deleted".into(), "Reading deleted!".into());
    t.insert("notify.alert_updated".into(), "Alert status updated!".into());
    t.insert("notify.alert_deleted".into(), "Alert deleted!".into());
    t.insert("notify.export_done".into(), "Export finished!".into());
    t.insert("notify.export_failed".into(), "Failed to export readings".into());

    // Readings CSV export
    t.insert("export.readings_stem".into(), "readings".into());
    t.insert("export.header.id".into(), "ID".into());
    t.insert("export.header.gasometro".into(), "Meter".into());
    t.insert("export.header.data_leitura".into(), "Date/Time".into());
    t.insert("export.header.consumo".into(), "Consumption (m\u{00B3})".into());
    t.insert("export.header.observacao".into(), "Note".into());
    t.insert("export.header.created_at".into(), "Created at".into());

    // Meter status
    t.insert("gasometer.status.ativo".into(), "Active".into());
    t.insert("gasometer.status.inativo".into(), "Inactive".into());
    t.insert("gasometer.status.manutencao".into(), "Under maintenance".into());

    // Alerts
    t.insert("alert.status.novo".into(), "New".into());
    t.insert("alert.status.em_analise".into(), "Under review".into());
    t.insert("alert.status.resolvido".into(), "Resolved".into());
    t.insert("alert.type.pico_consumo".into(), "Consumption spike".into());
    t.insert("alert.type.medidor_inativo".into(), "Meter inactive".into());
    t.insert("alert.type.falha_leitura".into(), "Read failure".into());
    t.insert("alert.type.consumo_zero".into(), "Zero consumption".into());

    // Dashboard
    t.insert("dashboard.total_gasometros".into(), "Total meters".into());
    t.insert("dashboard.total_leituras".into(), "Readings in period".into());
    t.insert("dashboard.media_consumo".into(), "Average daily consumption".into());
    t.insert("dashboard.alertas_ativos".into(), "Active alerts".into());

    t
}
