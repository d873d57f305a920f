//! Plain-text rendering of API results for chat replies.

use std::fmt::Write;

use crate::models::{EnrichedMatch, Fixture, TeamStatistics};

/// Telegram rejects messages above 4096 characters.
const MAX_LIST_ITEMS: usize = 40;

pub fn format_match_data(data: &EnrichedMatch) -> String {
    let fixture = &data.fixture;
    let mut out = String::from("Dados da Partida:\n\n");

    let _ = writeln!(out, "ID: {}", fixture.fixture_id);
    let _ = writeln!(
        out,
        "Confronto: {} x {}",
        fixture.home_team.name, fixture.away_team.name
    );
    let _ = writeln!(out, "Data: {}", fixture.date);
    let _ = writeln!(out, "Local: {}", venue(fixture));
    if let Some(referee) = &fixture.referee {
        let _ = writeln!(out, "Árbitro: {referee}");
    }
    let _ = writeln!(out, "Status: {}", fixture.status.long);

    write_team_block(&mut out, &fixture.home_team.name, data.home_statistics.as_ref());
    write_team_block(&mut out, &fixture.away_team.name, data.away_statistics.as_ref());

    out.trim_end().to_string()
}

fn write_team_block(out: &mut String, name: &str, stats: Option<&TeamStatistics>) {
    let _ = writeln!(out, "\n{name}:");
    let Some(s) = stats else {
        let _ = writeln!(out, "  Estatísticas indisponíveis");
        return;
    };
    let _ = writeln!(
        out,
        "  Jogos: {} | Gols: {} pró, {} contra",
        s.matches_played, s.goals_for, s.goals_against
    );
    let _ = writeln!(
        out,
        "  Média de gols: {:.2} casa, {:.2} fora",
        s.avg_goals_home, s.avg_goals_away
    );
    let _ = writeln!(
        out,
        "  Vitórias: {:.0}% casa, {:.0}% fora",
        s.win_pct_home, s.win_pct_away
    );
    let _ = writeln!(out, "  Cartões por jogo: {:.2}", s.card_average());
    if let Some(form) = &s.recent_form {
        let _ = writeln!(out, "  Forma: {form}");
    }
}

fn venue(fixture: &Fixture) -> String {
    match (&fixture.venue, &fixture.venue_city) {
        (Some(v), Some(c)) => format!("{v}, {c}"),
        (Some(v), None) => v.clone(),
        (None, Some(c)) => c.clone(),
        (None, None) => "Desconhecido".to_string(),
    }
}

pub fn format_fixture_list(title: &str, fixtures: &[Fixture]) -> String {
    if fixtures.is_empty() {
        return format!("{title}: nenhum confronto encontrado.");
    }

    let mut out = format!("{title} ({}):\n", fixtures.len());
    for f in fixtures.iter().take(MAX_LIST_ITEMS) {
        let _ = writeln!(
            out,
            "• {} x {} ({}) [ID {}]",
            f.home_team.name, f.away_team.name, f.date, f.fixture_id
        );
    }
    if fixtures.len() > MAX_LIST_ITEMS {
        let _ = writeln!(out, "... e mais {}", fixtures.len() - MAX_LIST_ITEMS);
    }
    out.trim_end().to_string()
}
