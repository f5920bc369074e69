use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

/// Prizes (奖品库存表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    Name,
    Image,
    Quantity,
    Supplier,
    CreatedAt,
    UpdatedAt,
}

/// Records (中奖 / 兑奖记录)
#[derive(DeriveIden)]
enum Records {
    Table,
    Id,
    PrizeId,
    Phone,
    Vipcard,
    Quantity,
    RecordType,
    Status,
    CreatedAt,
    UpdatedAt,
}

/// Settings (键值配置，含兑奖密码)
#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    SettingKey,
    SettingValue,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// quantity 同时是库存与抽奖权重: 概率 = quantity / Σquantity
///
/// records 上 (phone, vipcard) 唯一: 每个会员身份最多一条中奖记录
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::Image).text().null())
                    .col(
                        ColumnDef::new(Prizes::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Prizes::Supplier).string_len(255).null())
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_supplier")
                    .table(Prizes::Table)
                    .col(Prizes::Supplier)
                    .to_owned(),
            )
            .await?;

        // 记录表（奖品删除后 prize_id 置空，历史记录保留）
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Records::PrizeId).integer().null())
                    .col(ColumnDef::new(Records::Phone).string_len(64).not_null())
                    .col(ColumnDef::new(Records::Vipcard).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Records::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Records::RecordType)
                            .string_len(16)
                            .not_null()
                            .default("draw"),
                    )
                    .col(
                        ColumnDef::new(Records::Status)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Records::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Records::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_prize")
                            .from(Records::Table, Records::PrizeId)
                            .to(Prizes::Table, Prizes::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个身份只能有一条记录，抽奖并发由此约束兜底
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_identity_unique")
                    .table(Records::Table)
                    .col(Records::Phone)
                    .col(Records::Vipcard)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_prize_id")
                    .table(Records::Table)
                    .col(Records::PrizeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_created_at")
                    .table(Records::Table)
                    .col(Records::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 配置表
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Settings::SettingKey)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Settings::SettingValue).text().null())
                    .col(ColumnDef::new(Settings::Description).string_len(255).null())
                    .col(
                        ColumnDef::new(Settings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Settings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 兑奖密码初始为空，空密码永远校验失败，需管理员设置
        let conn = manager.get_connection();
        let insert_sql = r#"
INSERT INTO settings (setting_key, setting_value, description)
VALUES ('redeem_password', '', '兑奖密码')
ON CONFLICT (setting_key) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            insert_sql.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：记录 -> 奖品 -> 配置
        manager
            .drop_table(Table::drop().if_exists().table(Records::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Settings::Table).to_owned())
            .await?;

        Ok(())
    }
}
