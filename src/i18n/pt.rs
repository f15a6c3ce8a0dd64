//! Tradu\u{00E7}\u{00F5}es em portugu\u{00EA}s (Brasil)

use std::collections::HashMap;

pub fn get_translations() -> HashMap<String, String> {
    let mut t = HashMap::new();

    // App general
    t.insert("app.title".into(), "GasControl".into());
    t.insert("app.version".into(), "Vers\u{00E3}o".into());

    // Units
    t.insert("unit.cubic_meters".into(), "m\u{00B3}".into());

    // Formatting
    t.insert("format.invalid_date".into(), "Data inv\u{00E1}lida".into());

    // Consumption checks
    t.insert("validation.consumption_negative".into(), "Consumo n\u{00E3}o pode ser negativo".into());
    t.insert("validation.consumption_not_finite".into(), "Consumo deve ser um n\u{00FA}mero v\u{00E1}lido".into());
    t.insert("validation.consumption_high".into(), "Consumo muito alto ({percent}% da m\u{00E9}dia)".into());
    t.insert("validation.consumption_high_zero_average".into(), "Consumo muito alto (leituras anteriores com m\u{00E9}dia zero)".into());

    // Reading form
    t.insert("form.gasometro_required".into(), "Selecione um gas\u{00F4}metro".into());
    t.insert("form.data_leitura_required".into(), "Data da leitura \u{00E9} obrigat\u{00F3}ria".into());
    t.insert("form.data_leitura_invalid".into(), "Data da leitura inv\u{00E1}lida".into());
    t.insert("form.data_leitura_future".into(), "Data da leitura n\u{00E3}o pode ser no futuro".into());
    t.insert("form.consumo_too_high".into(), "Consumo muito alto".into());

    // Meter form
    t.insert("form.identificador_required".into(), "Identificador \u{00E9} obrigat\u{00F3}rio".into());
    t.insert("form.identificador_too_long".into(), "Identificador muito longo".into());
    t.insert("form.descricao_required".into(), "Descri\u{00E7}\u{00E3}o \u{00E9} obrigat\u{00F3}ria".into());
    t.insert("form.descricao_too_long".into(), "Descri\u{00E7}\u{00E3}o muito longa".into());
    t.insert("form.localizacao_required".into(), "Localiza\u{00E7}\u{00E3}o \u{00E9} obrigat\u{00F3}ria".into());
    t.insert("form.localizacao_too_long".into(), "Localiza\u{00E7}\u{00E3}o muito longa".into());

    // Notifications
    t.insert("notify.unexpected_error".into(), "Erro inesperado".into());
    t.insert("notify.login_success".into(), "Login realizado com sucesso!".into());
    t.insert("notify.login_failed".into(), "Erro ao fazer login: {reason}".into());
    t.insert("notify.invalid_credentials".into(), "Credenciais inv\u{00E1}lidas".into());
    t.insert("notify.logout_success".into(), "Logout realizado com sucesso!".into());
    t.insert("notify.session_expired".into(), "Sess\u{00E3}o expirada, fa\u{00E7}a login novamente".into());
    t.insert("notify.gasometer_created".into(), "Gas\u{00F4}metro criado com sucesso!".into());
    t.insert("notify.gasometer_updated".into(), "Gas\u{00F4}metro atualizado com sucesso!".into());
    t.insert("notify.gasometer_deleted".into(), "Gas\u{00F4}metro exclu\u{00ED}do com sucesso!".into());
    t.insert("notify.reading_created".into(), "Leitura registrada com sucesso!".into());
    t.insert("notify.reading_updated".into(), "Leitura atualizada com sucesso!".into());
    t.insert("notify.reading_deleted".into(), "Leitura exclu\u{00ED}da com sucesso!".into());
    t.insert("notify.alert_updated".into(), "Status do alerta atualizado!".into());
    t.insert("notify.alert_deleted".into(), "Alerta exclu\u{00ED}do com sucesso!".into());
    t.insert("notify.export_done".into(), "Exporta\u{00E7}\u{00E3}o conclu\u{00ED}da!".into());
    t.insert("notify.export_failed".into(), "Erro ao exportar leituras".into());

    // Readings CSV export
    t.insert("export.readings_stem".into(), "leituras".into());
    t.insert("export.header.id".into(), "ID".into());
    t.insert("export.header.gasometro".into(), "Gasometro".into());
    t.insert("export.header.data_leitura".into(), "Data/Hora".into());
    t.insert("export.header.consumo".into(), "Consumo (m\u{00B3})".into());
    t.insert("export.header.observacao".into(), "Observacao".into());
    t.insert("export.header.created_at".into(), "Criado em".into());

    // Meter status
    t.insert("gasometer.status.ativo".into(), "Ativo".into());
    t.insert("gasometer.status.inativo".into(), "Inativo".into());
    t.insert("gasometer.status.manutencao".into(), "Manuten\u{00E7}\u{00E3}o".into());

    // Alerts
    t.insert("alert.status.novo".into(), "Novo".into());
    t.insert("alert.status.em_analise".into(), "Em an\u{00E1}lise".into());
    t.insert("alert.status.resolvido".into(), "Resolvido".into());
    t.insert("alert.type.pico_consumo".into(), "Pico de consumo".into());
    t.insert("alert.type.medidor_inativo".into(), "Medidor inativo".into());
    t.insert("alert.type.falha_leitura".into(), "Falha de leitura".into());
    t.insert("alert.type.consumo_zero".into(), "Consumo zero".into());

    // Dashboard
    t.insert("dashboard.total_gasometros".into(), "Total de gas\u{00F4}metros".into());
    t.insert("dashboard.total_leituras".into(), "Leituras no per\u{00ED}odo".into());
    t.insert("dashboard.media_consumo".into(), "M\u{00E9}dia de consumo di\u{00E1}rio".into());
    t.insert("dashboard.alertas_ativos".into(), "Alertas ativos".into());

    t
}
