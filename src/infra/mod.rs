pub mod steamcharts;
