use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Free-form role tag ("student", "teacher", "developer", ...)
    pub role: String,

    /// Institutional reference number, if any
    pub external_ref: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_records::Entity")]
    AttendanceRecords,

    #[sea_orm(has_many = "super::two_factor_codes::Entity")]
    TwoFactorCodes,
}

impl Related<super::attendance_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl Related<super::two_factor_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TwoFactorCodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
