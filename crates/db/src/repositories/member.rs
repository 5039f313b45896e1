//! Member roster and keyword alias lookups.
//!
//! CUIT and DNI filters run against the generated `*_digits` columns, so a
//! stored `20-12345678-9` matches the normalized `20123456789`.

use amarra_core::store::{Member, MemberKeyword, MemberRepository, StoreResult};
use amarra_shared::types::{KeywordId, MemberId};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::{PgStore, store_err};
use crate::entities::{member_keywords, members};

fn to_member(model: members::Model) -> Member {
    Member {
        id: MemberId::from_uuid(model.id),
        surname: model.surname,
        given_name: model.given_name,
        cuit: model.cuit,
        dni: model.dni,
        active: model.active,
    }
}

fn to_keyword(model: member_keywords::Model) -> MemberKeyword {
    MemberKeyword {
        id: KeywordId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        keyword: model.keyword,
        cuit: model.cuit,
    }
}

impl MemberRepository for PgStore {
    async fn find_members_by_cuit(&self, cuit: &str) -> StoreResult<Vec<Member>> {
        if cuit.is_empty() {
            return Ok(Vec::new());
        }
        let rows = members::Entity::find()
            .filter(members::Column::CuitDigits.eq(cuit))
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(to_member).collect())
    }

    async fn find_members_by_dni(&self, dni: &str) -> StoreResult<Vec<Member>> {
        if dni.is_empty() {
            return Ok(Vec::new());
        }
        let rows = members::Entity::find()
            .filter(members::Column::DniDigits.eq(dni))
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(to_member).collect())
    }

    async fn list_active_members(&self) -> StoreResult<Vec<Member>> {
        let rows = members::Entity::find()
            .filter(members::Column::Active.eq(true))
            .order_by_asc(members::Column::Surname)
            .order_by_asc(members::Column::GivenName)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(to_member).collect())
    }

    async fn get_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        let row = members::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(row.map(to_member))
    }

    async fn find_keyword_by_cuit(&self, cuit: &str) -> StoreResult<Option<MemberKeyword>> {
        if cuit.is_empty() {
            return Ok(None);
        }
        let row = member_keywords::Entity::find()
            .filter(member_keywords::Column::CuitDigits.eq(cuit))
            .order_by_asc(member_keywords::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(row.map(to_keyword))
    }
}
