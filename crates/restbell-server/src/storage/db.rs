//! `SQLite` database for the Restbell notification server.

restbell_core::define_database!(ServerDatabase, "Server database migrations complete");
