use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Links::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Links::OwnerId).string_len(36).not_null())
                    .col(ColumnDef::new(Links::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(Links::ShortCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Links::Alias)
                            .string_len(64)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Links::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Links::MaxClicks).big_integer().null())
                    .col(ColumnDef::new(Links::Password).string().null())
                    .col(
                        ColumnDef::new(Links::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Links::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Links::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Links::QrCode).text().null())
                    .col(ColumnDef::new(Links::Tags).text().not_null())
                    .col(ColumnDef::new(Links::Category).string_len(64).null())
                    .col(ColumnDef::new(Links::Metadata).text().not_null())
                    .col(ColumnDef::new(Links::UtmSource).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmMedium).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmCampaign).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmTerm).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmContent).string_len(255).null())
                    .col(ColumnDef::new(Links::MobileUrl).text().null())
                    .col(ColumnDef::new(Links::TabletUrl).text().null())
                    .col(ColumnDef::new(Links::DesktopUrl).text().null())
                    .col(ColumnDef::new(Links::OgTitle).string_len(255).null())
                    .col(ColumnDef::new(Links::OgDescription).text().null())
                    .col(ColumnDef::new(Links::OgImage).text().null())
                    .col(ColumnDef::new(Links::OgType).string_len(32).null())
                    .to_owned(),
            )
            .await?;

        // 按所有者列表查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_owner_created")
                    .table(Links::Table)
                    .col(Links::OwnerId)
                    .col(Links::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_expires_at")
                    .table(Links::Table)
                    .col(Links::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_links_expires_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_links_owner_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Links::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Links {
    Table,
    Id,
    OwnerId,
    OriginalUrl,
    ShortCode,
    Alias,
    Clicks,
    MaxClicks,
    Password,
    IsPrivate,
    CreatedAt,
    ExpiresAt,
    QrCode,
    Tags,
    Category,
    Metadata,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmTerm,
    UtmContent,
    MobileUrl,
    TabletUrl,
    DesktopUrl,
    OgTitle,
    OgDescription,
    OgImage,
    OgType,
}
