//! IWS-RS: conversion of pressure-dependent EPANET networks into intermittent water supply models

pub mod input;
pub mod model;
pub mod constants;
pub mod output;
pub mod utils;
pub mod error;
pub mod hydraulics;
pub mod splice;
pub mod discretize;
pub mod convert;
pub mod results;
pub mod postprocess;
