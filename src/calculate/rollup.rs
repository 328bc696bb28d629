//! Grouping functions for the three tiers.
//!
//! Row counters are `u64`. Score sums are `u128`, so adding any number of
//! `u64` scores is exact. A group with no matching
//! rows is never emitted.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{
    CompanyRollup, FilterSet, GameSession, Player, PlayerId, PlayerRanking, ProductRollup,
    Selection, Tenant, TenantId,
};

#[derive(Default)]
struct CompanyAcc<'a> {
    games: u64,
    players: HashSet<&'a PlayerId>,
}

/// Tier 1: one row per tenant. Filters never apply here.
pub fn company_rollups(sessions: &[GameSession], tenants: &[Tenant]) -> Vec<CompanyRollup> {
    let names: HashMap<&TenantId, &str> = tenants
        .iter()
        .map(|t| (&t.id, t.display_name.as_str()))
        .collect();

    let mut groups: BTreeMap<&TenantId, CompanyAcc> = BTreeMap::new();
    for s in sessions {
        let acc = groups.entry(&s.tenant_id).or_default();
        acc.games += 1;
        acc.players.insert(&s.player_id);
    }

    groups
        .into_iter()
        .map(|(tenant, acc)| CompanyRollup {
            company: tenant.clone(),
            display_name: names.get(tenant).map(|n| n.to_string()),
            total_games: acc.games,
            total_users: acc.players.len() as u64,
        })
        .collect()
}

#[derive(Default)]
struct ProductAcc<'a> {
    records: u64,
    score: u128,
    players: HashSet<&'a PlayerId>,
}

/// Tier 2: rows of `tenant` passing `filters`, grouped by (product, game type).
pub fn product_rollups(
    sessions: &[GameSession],
    tenant: &TenantId,
    filters: &FilterSet,
) -> Vec<ProductRollup> {
    let mut groups: BTreeMap<(&str, &str), ProductAcc> = BTreeMap::new();
    for s in sessions
        .iter()
        .filter(|s| &s.tenant_id == tenant && filters.matches(s))
    {
        let acc = groups
            .entry((s.product.as_str(), s.game_type.as_str()))
            .or_default();
        acc.records += 1;
        acc.score += u128::from(s.score);
        acc.players.insert(&s.player_id);
    }

    groups
        .into_iter()
        .map(|((product, game_type), acc)| ProductRollup {
            product: product.to_string(),
            game_type: game_type.to_string(),
            total_records: acc.records,
            total_players: acc.players.len() as u64,
            total_score: acc.score,
        })
        .collect()
}

#[derive(Default)]
struct PlayerAcc {
    points: u128,
    games: u64,
    wins: u64,
}

/// Tier 3: rows of `tenant` with exactly the selected product and game type,
/// grouped by player and sorted with [`sort_rankings`].
pub fn player_rankings(
    sessions: &[GameSession],
    tenant: &TenantId,
    selection: &Selection,
    players: &[Player],
) -> Vec<PlayerRanking> {
    let profiles: HashMap<&PlayerId, &Player> = players.iter().map(|p| (&p.id, p)).collect();

    let mut groups: HashMap<&PlayerId, PlayerAcc> = HashMap::new();
    for s in sessions.iter().filter(|s| {
        &s.tenant_id == tenant
            && s.product == selection.product
            && s.game_type == selection.game_type
    }) {
        let acc = groups.entry(&s.player_id).or_default();
        acc.points += u128::from(s.score);
        acc.games += 1;
        if s.won {
            acc.wins += 1;
        }
    }

    let mut rows: Vec<PlayerRanking> = groups
        .into_iter()
        .map(|(player_id, acc)| {
            let profile = profiles.get(player_id);
            PlayerRanking {
                player_id: player_id.clone(),
                username: profile
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| player_id.to_string()),
                avatar: profile.and_then(|p| p.avatar.clone()),
                total_points: acc.points,
                games_played: acc.games,
                wins: acc.wins,
            }
        })
        .collect();

    sort_rankings(&mut rows);
    rows
}

/// Points descending, then games played descending, then player id ascending.
pub fn sort_rankings(rows: &mut [PlayerRanking]) {
    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| b.games_played.cmp(&a.games_played))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tenant: &str, product: &str, game_type: &str, player: &str, score: u64, won: bool) -> GameSession {
        GameSession::new(tenant, product, game_type, player, score, won)
    }

    fn fixture() -> Vec<GameSession> {
        vec![
            row("acme", "Trivia", "quiz", "p1", 10, true),
            row("acme", "Trivia", "quiz", "p2", 20, false),
            row("acme", "Trivia", "speed", "p1", 7, true),
            row("acme", "Bingo", "quiz", "p3", 4, false),
            row("acme", "Bingo", "classic", "p3", 6, true),
            row("acme", "Bingo", "classic", "p1", 9, false),
            row("globex", "Trivia", "quiz", "p1", 100, true),
            row("globex", "Poker", "holdem", "g9", 50, true),
        ]
    }

    fn acme() -> TenantId {
        TenantId::from("acme")
    }

    fn find<'a>(rows: &'a [ProductRollup], product: &str, game_type: &str) -> &'a ProductRollup {
        rows.iter()
            .find(|r| r.product == product && r.game_type == game_type)
            .unwrap()
    }

    #[test]
    fn test_company_rollups_count_rows_and_distinct_players() {
        let rows = company_rollups(&fixture(), &[]);
        assert_eq!(rows.len(), 2);
        let acme = rows.iter().find(|r| r.company.as_str() == "acme").unwrap();
        assert_eq!(acme.total_games, 6);
        assert_eq!(acme.total_users, 3);
        assert!(acme.display_name.is_none());
        let globex = rows.iter().find(|r| r.company.as_str() == "globex").unwrap();
        assert_eq!((globex.total_games, globex.total_users), (2, 2));
    }

    #[test]
    fn test_company_rollups_empty_input() {
        assert!(company_rollups(&[], &[Tenant::new("acme", "Acme")]).is_empty());
    }

    #[test]
    fn test_product_rollups_unfiltered() {
        let rows = product_rollups(&fixture(), &acme(), &FilterSet::new());
        assert_eq!(rows.len(), 4);
        let quiz = find(&rows, "Trivia", "quiz");
        assert_eq!(
            (quiz.total_records, quiz.total_players, quiz.total_score),
            (2, 2, 30)
        );
        let classic = find(&rows, "Bingo", "classic");
        assert_eq!(
            (classic.total_records, classic.total_players, classic.total_score),
            (2, 2, 15)
        );
    }

    #[test]
    fn test_tier_two_records_sum_to_tier_one_games() {
        let sessions = fixture();
        for company in company_rollups(&sessions, &[]) {
            let detail = product_rollups(&sessions, &company.company, &FilterSet::new());
            let records: u64 = detail.iter().map(|r| r.total_records).sum();
            assert_eq!(records, company.total_games, "tenant {}", company.company);
        }
    }

    #[test]
    fn test_tier_three_points_sum_to_tier_two_score() {
        let sessions = fixture();
        for row in product_rollups(&sessions, &acme(), &FilterSet::new()) {
            let selection = Selection::new(row.product.clone(), row.game_type.clone()).unwrap();
            let players = player_rankings(&sessions, &acme(), &selection, &[]);
            let points: u128 = players.iter().map(|p| p.total_points).sum();
            assert_eq!(points, row.total_score);
            let games: u64 = players.iter().map(|p| p.games_played).sum();
            assert_eq!(games, row.total_records);
        }
    }

    #[test]
    fn test_product_filter_is_or_within_axis() {
        let filters = FilterSet::new().with_product("Trivia").with_product("Bingo");
        let rows = product_rollups(&fixture(), &acme(), &filters);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_filter_axes_combine_with_and() {
        let filters = FilterSet::new().with_product("Bingo").with_game_type("quiz");
        let rows = product_rollups(&fixture(), &acme(), &filters);
        assert_eq!(rows.len(), 1);
        assert_eq!(find(&rows, "Bingo", "quiz").total_score, 4);
    }

    #[test]
    fn test_filter_matching_nothing_is_empty() {
        let filters = FilterSet::new().with_product("Poker");
        assert!(product_rollups(&fixture(), &acme(), &filters).is_empty());
    }

    #[test]
    fn test_adding_product_filter_never_grows_rows() {
        let sessions = fixture();
        let base = product_rollups(&sessions, &acme(), &FilterSet::new().with_product("Trivia"));
        let tighter = FilterSet::new().with_product("Trivia").with_game_type("quiz");
        let narrowed = product_rollups(&sessions, &acme(), &tighter);
        for row in &narrowed {
            let before = find(&base, &row.product, &row.game_type);
            assert!(row.total_records <= before.total_records);
            assert!(row.total_score <= before.total_score);
        }
        let unfiltered = product_rollups(&sessions, &acme(), &FilterSet::new());
        for row in &base {
            let before = find(&unfiltered, &row.product, &row.game_type);
            assert!(row.total_records <= before.total_records);
            assert!(row.total_score <= before.total_score);
        }
    }

    #[test]
    fn test_player_rankings_ignore_other_tenants_and_pairs() {
        let selection = Selection::new("Trivia", "quiz").unwrap();
        let rows = player_rankings(&fixture(), &acme(), &selection, &[]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_id.as_str(), "p2");
        assert_eq!(rows[1].player_id.as_str(), "p1");
        assert_eq!(rows[1].total_points, 10);
        assert_eq!(rows[1].wins, 1);
    }

    #[test]
    fn test_ranking_tie_breaks() {
        let sessions = vec![
            row("acme", "Trivia", "quiz", "zed", 10, false),
            row("acme", "Trivia", "quiz", "amy", 10, false),
            row("acme", "Trivia", "quiz", "bob", 5, true),
            row("acme", "Trivia", "quiz", "bob", 5, false),
            row("acme", "Trivia", "quiz", "top", 30, false),
        ];
        let selection = Selection::new("Trivia", "quiz").unwrap();
        let rows = player_rankings(&sessions, &acme(), &selection, &[]);
        let order: Vec<&str> = rows.iter().map(|r| r.player_id.as_str()).collect();
        // bob ties on points but has played more games; amy beats zed on id
        assert_eq!(order, vec!["top", "bob", "amy", "zed"]);
        assert_eq!(rows[1].games_played, 2);
        assert_eq!(rows[1].wins, 1);
    }

    #[test]
    fn test_player_rankings_profile_join() {
        let selection = Selection::new("Trivia", "quiz").unwrap();
        let players = vec![Player::new("p1", "Alex").with_avatar("a.png")];
        let rows = player_rankings(&fixture(), &acme(), &selection, &players);
        let p1 = rows.iter().find(|r| r.player_id.as_str() == "p1").unwrap();
        assert_eq!(p1.username, "Alex");
        assert_eq!(p1.avatar.as_deref(), Some("a.png"));
        let p2 = rows.iter().find(|r| r.player_id.as_str() == "p2").unwrap();
        assert_eq!(p2.username, "p2");
        assert!(p2.avatar.is_none());
    }

    #[test]
    fn test_large_scores_do_not_overflow_u32() {
        let sessions = vec![
            row("acme", "Trivia", "quiz", "p1", u32::MAX as u64, false),
            row("acme", "Trivia", "quiz", "p1", u32::MAX as u64, false),
        ];
        let rows = product_rollups(&sessions, &acme(), &FilterSet::new());
        assert_eq!(rows[0].total_score, 2 * u128::from(u32::MAX));
    }

    #[test]
    fn test_scores_past_u64_range_sum_exactly() {
        let half = u64::MAX / 2 + 1;
        let sessions = vec![
            row("acme", "Trivia", "quiz", "p1", half, false),
            row("acme", "Trivia", "quiz", "p1", half, true),
            row("acme", "Trivia", "quiz", "p2", u64::MAX, false),
        ];
        let expected = 2 * u128::from(half) + u128::from(u64::MAX);

        let rows = product_rollups(&sessions, &acme(), &FilterSet::new());
        assert_eq!(rows[0].total_score, expected);

        let selection = Selection::new("Trivia", "quiz").unwrap();
        let players = player_rankings(&sessions, &acme(), &selection, &[]);
        assert_eq!(players[0].player_id.as_str(), "p1");
        assert_eq!(players[0].total_points, 2 * u128::from(half));
        assert_eq!(players[1].total_points, u128::from(u64::MAX));
        let points: u128 = players.iter().map(|p| p.total_points).sum();
        assert_eq!(points, rows[0].total_score);
    }
}
