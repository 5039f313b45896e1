//! The individual tiers of the identity cascade.
//!
//! Store-backed tiers return `Ok(None)` for "no match at this tier" and
//! leave error handling to the matcher. Fuzzy tiers work on a roster that
//! the matcher loads once per movement.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{
    CROSS_CHECK_CONFIDENCE, CUIT_CONFIDENCE, DNI_CONFIDENCE, DNI_NAME_MIN_SIMILARITY,
    FULL_NAME_MIN_SIMILARITY, KEYWORD_CONFIDENCE, MatchResult, MatchTier,
    SURNAME_MAX_SIMILARITY, SURNAME_MIN_SIMILARITY,
};
use crate::similarity::{full_name_similarity, similarity_pct};
use crate::statement::Movement;
use crate::store::{Member, MemberRepository, StoreResult};
use crate::text::{embedded_dni, is_valid_cuit, normalize_id, normalize_text};

/// Returns true if the movement carries what `tier` needs to run at all.
#[must_use]
pub fn has_required_input(tier: MatchTier, movement: &Movement) -> bool {
    match tier {
        MatchTier::Cuit => movement.cuit().is_some_and(|c| c.len() >= 11),
        MatchTier::Dni => has_dni(movement) && has_name(movement),
        MatchTier::CrossCheck => {
            movement.cuit().is_some_and(is_valid_cuit) || has_dni(movement)
        }
        MatchTier::Keyword => movement.cuit().is_some_and(is_valid_cuit),
        MatchTier::FullName => has_name(movement),
        MatchTier::Surname => movement.surname().is_some_and(|s| !s.is_empty()),
        MatchTier::Unmatched => false,
    }
}

fn has_dni(movement: &Movement) -> bool {
    movement.dni().is_some_and(|d| (7..=8).contains(&d.len()))
}

fn has_name(movement: &Movement) -> bool {
    movement.surname().is_some_and(|s| !s.is_empty())
        || movement.given_name().is_some_and(|g| !g.is_empty())
}

/// Similarity percentage rounded half-up to a whole confidence.
#[must_use]
pub fn to_confidence(similarity: Decimal) -> u8 {
    similarity
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(0)
}

fn movement_name_similarity(movement: &Movement, member: &Member) -> Decimal {
    full_name_similarity(
        movement.surname().unwrap_or_default(),
        movement.given_name().unwrap_or_default(),
        &member.surname,
        &member.given_name,
    )
}

/// Highest-scoring member; ties keep the first one encountered.
fn best_by<'a, F>(members: &'a [Member], score: F) -> Option<(&'a Member, Decimal)>
where
    F: Fn(&Member) -> Decimal,
{
    let mut best: Option<(&Member, Decimal)> = None;
    for member in members {
        let value = score(member);
        if best.is_none_or(|(_, current)| value > current) {
            best = Some((member, value));
        }
    }
    best
}

/// Tier A: exact normalized CUIT.
pub async fn by_cuit<S: MemberRepository>(
    store: &S,
    movement: &Movement,
) -> StoreResult<Option<MatchResult>> {
    let Some(cuit) = movement.cuit().filter(|c| c.len() >= 11) else {
        return Ok(None);
    };
    let candidates = store.find_members_by_cuit(cuit).await?;
    Ok(candidates.first().map(|member| {
        MatchResult::matched(
            member,
            MatchTier::Cuit,
            CUIT_CONFIDENCE,
            format!("CUIT {cuit} matches exactly"),
        )
    }))
}

/// Tier B: exact DNI, confirmed by at least 50% full-name similarity.
pub async fn by_dni<S: MemberRepository>(
    store: &S,
    movement: &Movement,
) -> StoreResult<Option<MatchResult>> {
    if !has_required_input(MatchTier::Dni, movement) {
        return Ok(None);
    }
    let Some(dni) = movement.dni() else {
        return Ok(None);
    };
    let candidates = store.find_members_by_dni(dni).await?;
    let Some((member, similarity)) =
        best_by(&candidates, |m| movement_name_similarity(movement, m))
    else {
        return Ok(None);
    };
    if similarity < Decimal::from(DNI_NAME_MIN_SIMILARITY) {
        tracing::debug!(
            dni,
            member_id = %member.id,
            %similarity,
            "DNI hit rejected on name mismatch"
        );
        return Ok(None);
    }
    Ok(Some(MatchResult::matched(
        member,
        MatchTier::Dni,
        DNI_CONFIDENCE,
        format!("DNI {dni} matches, name similarity {similarity}%"),
    )))
}

/// Tier C: the CUIT's embedded DNI agrees with a member's DNI, and the
/// member's own CUIT (if stored) embeds the same DNI.
pub async fn by_cross_check<S: MemberRepository>(
    store: &S,
    movement: &Movement,
) -> StoreResult<Option<MatchResult>> {
    let Some(cuit) = movement.cuit().filter(|c| is_valid_cuit(c)) else {
        return Ok(None);
    };
    let Some(derived) = embedded_dni(cuit) else {
        return Ok(None);
    };
    if movement
        .dni()
        .is_some_and(|dni| dni.trim_start_matches('0') != derived)
    {
        return Ok(None);
    }

    let candidates = store.find_members_by_dni(&derived).await?;
    let agreeing = candidates.iter().find(|member| {
        let dni_agrees = member
            .dni
            .as_deref()
            .is_some_and(|dni| normalize_id(dni).trim_start_matches('0') == derived);
        let cuit_agrees = member
            .cuit
            .as_deref()
            .is_none_or(|own| embedded_dni(own).as_deref() == Some(derived.as_str()));
        dni_agrees && cuit_agrees
    });
    Ok(agreeing.map(|member| {
        MatchResult::matched(
            member,
            MatchTier::CrossCheck,
            CROSS_CHECK_CONFIDENCE,
            format!("CUIT {cuit} embeds DNI {derived} of the member"),
        )
    }))
}

/// Tier C, reverse direction: the movement's DNI is embedded in a member's
/// stored CUIT. A member DNI, when present, must agree as well.
#[must_use]
pub fn by_cross_check_dni(movement: &Movement, roster: &[Member]) -> Option<MatchResult> {
    let dni = movement.dni().filter(|_| has_dni(movement))?;
    let wanted = dni.trim_start_matches('0');
    // A payer CUIT that embeds some other DNI contradicts the description.
    if let Some(cuit) = movement.cuit().filter(|c| is_valid_cuit(c))
        && embedded_dni(cuit).as_deref() != Some(wanted)
    {
        return None;
    }

    let member = roster.iter().find(|member| {
        let cuit_embeds = member
            .cuit
            .as_deref()
            .is_some_and(|own| embedded_dni(own).as_deref() == Some(wanted));
        let dni_agrees = member
            .dni
            .as_deref()
            .is_none_or(|own| normalize_id(own).trim_start_matches('0') == wanted);
        cuit_embeds && dni_agrees
    })?;
    Some(MatchResult::matched(
        member,
        MatchTier::CrossCheck,
        CROSS_CHECK_CONFIDENCE,
        format!("DNI {dni} is embedded in the member's CUIT"),
    ))
}

/// Tier D: best full-name similarity across the roster, at least 85%.
#[must_use]
pub fn by_full_name(movement: &Movement, roster: &[Member]) -> Option<MatchResult> {
    if !has_name(movement) {
        return None;
    }
    let (member, similarity) = best_by(roster, |m| movement_name_similarity(movement, m))?;
    (similarity >= Decimal::from(FULL_NAME_MIN_SIMILARITY)).then(|| {
        MatchResult::matched(
            member,
            MatchTier::FullName,
            to_confidence(similarity),
            format!("full name similarity {similarity}%"),
        )
    })
}

/// Tier E: best surname-only similarity, accepted inside the 60-80% band.
#[must_use]
pub fn by_surname(movement: &Movement, roster: &[Member]) -> Option<MatchResult> {
    let surname = normalize_text(movement.surname()?);
    if surname.is_empty() {
        return None;
    }
    let (member, similarity) = best_by(roster, |m| {
        similarity_pct(&surname, &normalize_text(&m.surname))
    })?;
    let band = Decimal::from(SURNAME_MIN_SIMILARITY)..=Decimal::from(SURNAME_MAX_SIMILARITY);
    band.contains(&similarity).then(|| {
        MatchResult::matched(
            member,
            MatchTier::Surname,
            to_confidence(similarity),
            format!("surname similarity {similarity}%"),
        )
    })
}

/// Tier E.5: keyword alias bound to the payer CUIT. Never looked up by DNI.
pub async fn by_keyword<S: MemberRepository>(
    store: &S,
    movement: &Movement,
) -> StoreResult<Option<MatchResult>> {
    let Some(cuit) = movement.cuit().filter(|c| is_valid_cuit(c)) else {
        return Ok(None);
    };
    let Some(keyword) = store.find_keyword_by_cuit(cuit).await? else {
        return Ok(None);
    };
    let member = store.get_member(keyword.member_id).await?;
    Ok(member.map(|member| {
        MatchResult::matched(
            &member,
            MatchTier::Keyword,
            KEYWORD_CONFIDENCE,
            format!("keyword \"{}\" registered for CUIT {cuit}", keyword.keyword),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amarra_shared::types::MemberId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn member(surname: &str, given: &str) -> Member {
        Member {
            id: MemberId::new(),
            surname: surname.into(),
            given_name: given.into(),
            cuit: None,
            dni: None,
            active: true,
        }
    }

    fn movement(description: &str) -> Movement {
        Movement::new(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            description,
            dec!(1000),
            None,
        )
    }

    #[test]
    fn test_to_confidence_rounds_half_up() {
        assert_eq!(to_confidence(dec!(85.5)), 86);
        assert_eq!(to_confidence(dec!(84.49)), 84);
        assert_eq!(to_confidence(dec!(100)), 100);
    }

    #[test]
    fn test_full_name_requires_85() {
        let roster = vec![member("PEREZ", "JUAN"), member("GOMEZ", "MARIA")];
        let found = by_full_name(&movement("TRANSFERENCIA - PEREZ JUAN"), &roster).unwrap();
        assert_eq!(found.member_id, Some(roster[0].id));
        assert_eq!(found.confidence, 100);

        assert!(by_full_name(&movement("TRANSFERENCIA - RODRIGUEZ ANA"), &roster).is_none());
    }

    #[test]
    fn test_full_name_ties_keep_first() {
        let roster = vec![member("PEREZ", "JUAN"), member("PEREZ", "JUAN")];
        let found = by_full_name(&movement("PEREZ JUAN"), &roster).unwrap();
        assert_eq!(found.member_id, Some(roster[0].id));
    }

    #[test]
    fn test_surname_band() {
        // PERES vs PEREZ = 80%, inside the band.
        let roster = vec![member("PEREZ", "ANA")];
        let found = by_surname(&movement("PERES"), &roster).unwrap();
        assert_eq!(found.tier, MatchTier::Surname);
        assert_eq!(found.confidence, 80);

        // Identical surname is 100%, above the band.
        assert!(by_surname(&movement("PEREZ"), &roster).is_none());
        // Unrelated surname is below it.
        assert!(by_surname(&movement("IBARRA"), &roster).is_none());
    }

    #[test]
    fn test_required_inputs() {
        let bare = movement("TRANSFERENCIA RECIBIDA");
        for tier in MatchTier::CASCADE {
            assert!(!has_required_input(tier, &bare), "{tier} should not run");
        }

        let with_cuit = movement("20123456789");
        assert!(has_required_input(MatchTier::Cuit, &with_cuit));
        assert!(has_required_input(MatchTier::CrossCheck, &with_cuit));
        assert!(has_required_input(MatchTier::Keyword, &with_cuit));
        assert!(!has_required_input(MatchTier::Dni, &with_cuit));

        let with_dni = movement("DEPOSITO DNI 12345678");
        assert!(has_required_input(MatchTier::CrossCheck, &with_dni));
        assert!(!has_required_input(MatchTier::Keyword, &with_dni));
    }

    #[test]
    fn test_cross_check_from_dni_to_member_cuit() {
        let mut owner = member("LOPEZ", "ANA");
        owner.cuit = Some("27-12345678-4".into());
        let roster = vec![member("PEREZ", "JUAN"), owner.clone()];

        let deposit = movement("DEPOSITO DNI 12345678");
        assert!(has_required_input(MatchTier::CrossCheck, &deposit));
        let found = by_cross_check_dni(&deposit, &roster).unwrap();
        assert_eq!(found.tier, MatchTier::CrossCheck);
        assert_eq!(found.member_id, Some(owner.id));
        assert_eq!(found.confidence, 98);

        assert!(by_cross_check_dni(&movement("DEPOSITO DNI 87654321"), &roster).is_none());
    }

    #[test]
    fn test_cross_check_from_dni_rejects_disagreeing_member_dni() {
        let mut owner = member("LOPEZ", "ANA");
        owner.cuit = Some("27-12345678-4".into());
        owner.dni = Some("11111111".into());
        assert!(by_cross_check_dni(&movement("DEPOSITO DNI 12345678"), &[owner]).is_none());
    }

    #[test]
    fn test_empty_roster() {
        assert!(by_full_name(&movement("PEREZ JUAN"), &[]).is_none());
        assert!(by_cross_check_dni(&movement("DNI 12345678"), &[]).is_none());
        assert!(by_surname(&movement("PEREZ JUAN"), &[]).is_none());
    }
}
